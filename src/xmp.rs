//! XMP packets in JPEG APP1 segments.
//!
//! Reading flattens each top-level property of every `rdf:Description` into
//! store data: simple values and description attributes become one datum,
//! `rdf:Bag`/`rdf:Seq` one datum per item, and language alternatives the
//! `x-default` item. Structured properties have no store form; their XML is
//! kept verbatim and re-emitted when a fresh packet is built from the store.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, HashMap};

use crate::error::EngineError;
use crate::key::{Family, TagKey};
use crate::schema::xmp::{self as table, XmpKind};
use crate::store::MetadataStore;

pub(crate) const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// What a read taught us beyond the built-in tables: the shape of each
/// property, namespaces with no well-known prefix, and structured
/// properties kept as raw XML.
#[derive(Debug, Clone, Default)]
pub(crate) struct XmpContext {
    kinds: HashMap<TagKey, XmpKind>,
    namespaces: BTreeMap<String, String>,
    structured: Vec<RawProperty>,
}

/// A structured property as it appeared in the packet.
#[derive(Debug, Clone)]
struct RawProperty {
    key: TagKey,
    xml: String,
    /// `(prefix, uri)` bindings the XML relies on.
    bindings: Vec<(String, String)>,
}

impl XmpContext {
    pub fn kind_of(&self, key: &TagKey) -> Option<XmpKind> {
        self.kinds
            .get(key)
            .copied()
            .or_else(|| table::known_kind(key.group(), key.name()))
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        table::namespace_uri(prefix).or_else(|| self.namespaces.get(prefix).map(String::as_str))
    }
}

/// The packet inside an APP1 segment, if it is an XMP segment.
pub(crate) fn packet_of(contents: &[u8]) -> Option<&[u8]> {
    contents.strip_prefix(XMP_HEADER)
}

/// APP1 contents carrying `packet`.
pub(crate) fn segment_contents(packet: &str) -> Vec<u8> {
    let mut contents = Vec::with_capacity(XMP_HEADER.len() + packet.len());
    contents.extend_from_slice(XMP_HEADER);
    contents.extend_from_slice(packet.as_bytes());
    contents
}

// ============================================================================
// Reading
// ============================================================================

struct Property {
    key: TagKey,
    kind: XmpKind,
    /// Stack depth of the property element.
    depth: usize,
    /// Byte offset of the property's start tag in the packet.
    start: usize,
    text: String,
    items: Vec<(Option<String>, String)>,
    item: Option<(Option<String>, String)>,
    nested: bool,
}

struct Parser<'c, 's> {
    ctx: &'c mut XmpContext,
    source: &'s str,
    /// Prefix bindings declared in the document.
    scopes: HashMap<String, String>,
    stack: Vec<String>,
    desc_depth: Option<usize>,
    property: Option<Property>,
    out: Vec<(TagKey, String)>,
}

fn malformed(e: impl std::fmt::Display) -> EngineError {
    EngineError::corrupt(format!("Invalid XMP packet: {e}"))
}

fn attributes(e: &BytesStart) -> Result<Vec<(String, String)>, EngineError> {
    let mut found = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        found.push((key, value));
    }
    Ok(found)
}

impl Parser<'_, '_> {
    fn learn_namespaces(&mut self, attrs: &[(String, String)]) {
        for (name, uri) in attrs {
            let Some(prefix) = name.strip_prefix("xmlns:") else {
                continue;
            };
            self.scopes.insert(prefix.to_string(), uri.clone());
            let reserved = matches!(prefix, "x" | "rdf" | "xml") || uri == RDF_NS;
            if !reserved && table::prefix_for_uri(uri).is_none() {
                self.ctx.namespaces.insert(prefix.to_string(), uri.clone());
            }
        }
    }

    /// Store key for a qualified element or attribute name. Well-known
    /// namespaces always use their usual prefix.
    fn key_for(&self, qname: &str) -> Option<TagKey> {
        let (prefix, local) = qname.split_once(':')?;
        let canonical = self
            .scopes
            .get(prefix)
            .and_then(|uri| table::prefix_for_uri(uri))
            .unwrap_or(prefix);
        Some(TagKey::new(Family::Xmp, canonical, local))
    }

    /// `start..end` is the byte span of the tag in the packet.
    fn open(
        &mut self,
        e: &BytesStart,
        empty: bool,
        start: usize,
        end: usize,
    ) -> Result<(), EngineError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let attrs = attributes(e)?;
        self.learn_namespaces(&attrs);

        let under_rdf = self.stack.last().is_some_and(|p| p == "rdf:RDF");
        self.stack.push(name.clone());
        let depth = self.stack.len();

        if self.desc_depth.is_none() {
            if under_rdf && name == "rdf:Description" {
                self.desc_depth = Some(depth);
                for (attr, value) in &attrs {
                    if attr.starts_with("xmlns") || attr.starts_with("rdf:") {
                        continue;
                    }
                    if let Some(key) = self.key_for(attr) {
                        self.ctx.kinds.insert(key.clone(), XmpKind::Text);
                        self.out.push((key, value.clone()));
                    }
                }
            }
        } else if self.desc_depth == Some(depth - 1) {
            let nested = attrs
                .iter()
                .any(|(k, v)| k == "rdf:parseType" && v == "Resource");
            self.property = self.key_for(&name).map(|key| Property {
                key,
                kind: XmpKind::Text,
                depth,
                start,
                text: String::new(),
                items: Vec::new(),
                item: None,
                nested,
            });
        } else if let Some(p) = self.property.as_mut() {
            if depth == p.depth + 1 {
                match name.as_str() {
                    "rdf:Bag" => p.kind = XmpKind::Bag,
                    "rdf:Seq" => p.kind = XmpKind::Seq,
                    "rdf:Alt" => p.kind = XmpKind::LangAlt,
                    _ => p.nested = true,
                }
            } else if depth == p.depth + 2 && name == "rdf:li" {
                let lang = attrs
                    .iter()
                    .find(|(k, _)| k == "xml:lang")
                    .map(|(_, v)| v.clone());
                p.item = Some((lang, String::new()));
            } else {
                p.nested = true;
            }
        }

        if empty {
            self.close(end);
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let depth = self.stack.len();
        let Some(p) = self.property.as_mut() else {
            return;
        };
        if depth == p.depth {
            p.text.push_str(text);
        } else if depth == p.depth + 2 {
            if let Some((_, value)) = p.item.as_mut() {
                value.push_str(text);
            }
        }
    }

    /// `end` is the byte offset just past the end tag.
    fn close(&mut self, end: usize) {
        let depth = self.stack.len();
        self.stack.pop();

        if let Some(p) = self.property.as_mut() {
            if depth == p.depth + 2 {
                if let Some(item) = p.item.take() {
                    p.items.push(item);
                }
            }
        }
        if self.property.as_ref().is_some_and(|p| p.depth == depth) {
            if let Some(p) = self.property.take() {
                self.finish(p, end);
            }
        }
        if self.desc_depth == Some(depth) {
            self.desc_depth = None;
        }
    }

    fn finish(&mut self, p: Property, end: usize) {
        if p.nested {
            self.keep_structured(p.key, p.start, end);
            return;
        }
        self.ctx.kinds.insert(p.key.clone(), p.kind);
        match p.kind {
            XmpKind::Text => self.out.push((p.key, p.text)),
            XmpKind::Bag | XmpKind::Seq => {
                for (_, value) in p.items {
                    self.out.push((p.key.clone(), value));
                }
            }
            XmpKind::LangAlt => {
                let pick = p
                    .items
                    .iter()
                    .position(|(lang, _)| lang.as_deref() == Some("x-default"))
                    .unwrap_or(0);
                if let Some((_, value)) = p.items.into_iter().nth(pick) {
                    self.out.push((p.key, value));
                }
            }
        }
    }

    fn keep_structured(&mut self, key: TagKey, start: usize, end: usize) {
        let Some(xml) = self.source.get(start..end).map(str::trim) else {
            log::warn!("Cannot keep structured XMP property {key}");
            return;
        };
        let mut bindings: Vec<(String, String)> = self
            .scopes
            .iter()
            .filter(|(prefix, _)| !matches!(prefix.as_str(), "x" | "rdf" | "xml"))
            .filter(|(prefix, _)| xml.contains(&format!("{prefix}:")))
            .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
            .collect();
        bindings.sort();
        log::debug!("Keeping structured XMP property {key} as raw XML");
        self.ctx.structured.push(RawProperty {
            key,
            xml: xml.to_string(),
            bindings,
        });
    }
}

/// Decode an XMP packet into store data, learning property kinds and
/// namespaces into `ctx`.
pub(crate) fn decode(
    packet: &[u8],
    store: &mut MetadataStore,
    ctx: &mut XmpContext,
) -> Result<(), EngineError> {
    let text = String::from_utf8_lossy(packet);
    let source = text.trim_end_matches(['\0', ' ', '\n', '\r', '\t']);
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut parser = Parser {
        ctx,
        source,
        scopes: HashMap::new(),
        stack: Vec::new(),
        desc_depth: None,
        property: None,
        out: Vec::new(),
    };

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(malformed)?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(ref e) => parser.open(e, false, start, end)?,
            Event::Empty(ref e) => parser.open(e, true, start, end)?,
            Event::Text(ref e) => {
                let text = e.unescape().map_err(malformed)?;
                parser.text(&text);
            }
            Event::CData(ref e) => parser.text(&String::from_utf8_lossy(e)),
            Event::End(_) => parser.close(end),
            Event::Eof => break,
            _ => {}
        }
    }

    log::debug!("XMP: {} properties decoded", parser.out.len());
    for (key, value) in parser.out {
        store.push(key, value);
    }
    Ok(())
}

// ============================================================================
// Writing
// ============================================================================

/// Escape special XML characters.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serialize the store as a complete XMP packet; `None` for an empty store.
///
/// Structured properties from the last read follow the store's properties,
/// unless the store now holds a value under the same key.
pub(crate) fn build_packet(
    store: &MetadataStore,
    ctx: &XmpContext,
) -> Result<Option<String>, EngineError> {
    if store.is_empty() {
        return Ok(None);
    }

    let keys = store.keys();
    let structured: Vec<&RawProperty> = ctx
        .structured
        .iter()
        .filter(|raw| !keys.contains(&&raw.key))
        .collect();

    let mut prefixes: Vec<&str> = Vec::new();
    for key in &keys {
        if !prefixes.contains(&key.group()) {
            prefixes.push(key.group());
        }
    }

    let mut xmp = String::new();
    xmp.push_str("<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n");
    xmp.push_str("<x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n");
    xmp.push_str(&format!("<rdf:RDF xmlns:rdf=\"{RDF_NS}\">\n"));
    xmp.push_str("<rdf:Description rdf:about=\"\"");
    for prefix in &prefixes {
        let uri = ctx
            .namespace_uri(prefix)
            .ok_or_else(|| EngineError::invalid_key(&format!("Xmp.{prefix}")))?;
        xmp.push_str(&format!("\n  xmlns:{prefix}=\"{}\"", xml_escape(uri)));
    }
    for (prefix, uri) in structured.iter().flat_map(|raw| &raw.bindings) {
        if !prefixes.contains(&prefix.as_str()) {
            prefixes.push(prefix);
            xmp.push_str(&format!("\n  xmlns:{prefix}=\"{}\"", xml_escape(uri)));
        }
    }
    xmp.push_str(">\n");

    for key in keys {
        let qname = format!("{}:{}", key.group(), key.name());
        let mut values = store.values(key).map(|d| xml_escape(d.value()));
        match ctx.kind_of(key).unwrap_or(XmpKind::Text) {
            XmpKind::Text => {
                if let Some(v) = values.next() {
                    xmp.push_str(&format!("  <{qname}>{v}</{qname}>\n"));
                }
            }
            XmpKind::LangAlt => {
                if let Some(v) = values.next() {
                    xmp.push_str(&format!(
                        "  <{qname}><rdf:Alt><rdf:li xml:lang=\"x-default\">{v}</rdf:li></rdf:Alt></{qname}>\n"
                    ));
                }
            }
            kind @ (XmpKind::Bag | XmpKind::Seq) => {
                let container = if kind == XmpKind::Bag { "rdf:Bag" } else { "rdf:Seq" };
                xmp.push_str(&format!("  <{qname}><{container}>\n"));
                for v in values {
                    xmp.push_str(&format!("    <rdf:li>{v}</rdf:li>\n"));
                }
                xmp.push_str(&format!("  </{container}></{qname}>\n"));
            }
        }
    }

    for raw in structured {
        xmp.push_str(&format!("  {}\n", raw.xml));
    }

    xmp.push_str("</rdf:Description>\n");
    xmp.push_str("</rdf:RDF>\n");
    xmp.push_str("</x:xmpmeta>\n");
    xmp.push_str("<?xpacket end=\"w\"?>");
    Ok(Some(xmp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    const SAMPLE: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:xap="http://ns.adobe.com/xap/1.0/"
        xmlns:my="http://example.com/ns/my/"
        xap:CreatorTool="Darkroom 2.1">
      <dc:title>
        <rdf:Alt>
          <rdf:li xml:lang="de-DE">Sonnenuntergang</rdf:li>
          <rdf:li xml:lang="x-default">Sunset &amp; sea</rdf:li>
        </rdf:Alt>
      </dc:title>
      <dc:subject>
        <rdf:Bag>
          <rdf:li>sunset</rdf:li>
          <rdf:li>nature</rdf:li>
        </rdf:Bag>
      </dc:subject>
      <my:rating>5</my:rating>
      <my:location rdf:parseType="Resource">
        <my:city>Oslo</my:city>
      </my:location>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    fn decoded(packet: &str) -> (Vec<(String, String)>, XmpContext) {
        let mut store = MetadataStore::new();
        let mut ctx = XmpContext::default();
        decode(packet.as_bytes(), &mut store, &mut ctx).unwrap();
        let pairs = store
            .iter()
            .map(|d| (d.key().to_string(), d.value().to_string()))
            .collect();
        (pairs, ctx)
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    // ── reading ───────────────────────────────────────────────────

    #[test]
    fn flattens_properties() {
        let (pairs, _) = decoded(SAMPLE);
        assert_eq!(
            pairs,
            vec![
                pair("Xmp.xmp.CreatorTool", "Darkroom 2.1"),
                pair("Xmp.dc.title", "Sunset & sea"),
                pair("Xmp.dc.subject", "sunset"),
                pair("Xmp.dc.subject", "nature"),
                pair("Xmp.my.rating", "5"),
            ]
        );
    }

    #[test]
    fn learns_kinds_and_namespaces() {
        let (_, ctx) = decoded(SAMPLE);
        let key: TagKey = "Xmp.my.rating".parse().unwrap();
        assert_eq!(ctx.kind_of(&key), Some(XmpKind::Text));
        assert_eq!(ctx.namespace_uri("my"), Some("http://example.com/ns/my/"));
        // Non-standard prefix for a well-known namespace is not learned
        assert_eq!(ctx.namespace_uri("xap"), None);
    }

    #[test]
    fn seq_in_place_of_known_bag_wins() {
        let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:subject><rdf:Seq><rdf:li>b</rdf:li><rdf:li>a</rdf:li></rdf:Seq></dc:subject>
</rdf:Description></rdf:RDF></x:xmpmeta>"#;
        let (pairs, ctx) = decoded(packet);
        assert_eq!(pairs, vec![pair("Xmp.dc.subject", "b"), pair("Xmp.dc.subject", "a")]);
        assert_eq!(
            ctx.kind_of(&"Xmp.dc.subject".parse().unwrap()),
            Some(XmpKind::Seq)
        );
    }

    #[test]
    fn lang_alt_without_default_uses_first() {
        let packet = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:rights><rdf:Alt><rdf:li xml:lang="fr">Libre</rdf:li><rdf:li xml:lang="en">Free</rdf:li></rdf:Alt></dc:rights>
</rdf:Description></rdf:RDF>"#;
        let (pairs, _) = decoded(packet);
        assert_eq!(pairs, vec![pair("Xmp.dc.rights", "Libre")]);
    }

    #[test]
    fn broken_xml_is_corrupt() {
        let mut store = MetadataStore::new();
        let mut ctx = XmpContext::default();
        let err = decode(b"<rdf:RDF><rdf:Description></rdf:RDF>", &mut store, &mut ctx).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::CorruptData);
        assert!(store.is_empty());
    }

    #[test]
    fn segment_framing() {
        let contents = segment_contents("<x/>");
        assert_eq!(packet_of(&contents), Some(&b"<x/>"[..]));
        assert_eq!(packet_of(b"Exif\0\0II*\0"), None);
    }

    // ── writing ───────────────────────────────────────────────────

    #[test]
    fn packet_round_trip() {
        let (original, ctx) = decoded(SAMPLE);
        let mut store = MetadataStore::new();
        for (k, v) in &original {
            store.push(k.parse().unwrap(), v.clone());
        }

        let packet = build_packet(&store, &ctx).unwrap().unwrap();
        assert!(packet.contains("xmlns:my=\"http://example.com/ns/my/\""));
        assert!(packet.contains("Sunset &amp; sea"));

        let (reread, _) = decoded(&packet);
        assert_eq!(reread, original);
    }

    const HISTORY: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:xmpMM="http://ns.adobe.com/xap/1.0/mm/"
    xmlns:stEvt="http://ns.adobe.com/xap/1.0/sType/ResourceEvent#">
  <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Pier</rdf:li></rdf:Alt></dc:title>
  <xmpMM:History>
    <rdf:Seq>
      <rdf:li rdf:parseType="Resource">
        <stEvt:action>saved</stEvt:action>
        <stEvt:when>2024-03-09T10:00:00Z</stEvt:when>
      </rdf:li>
    </rdf:Seq>
  </xmpMM:History>
</rdf:Description>
</rdf:RDF>
</x:xmpmeta>"#;

    fn structured_xml(ctx: &XmpContext) -> Vec<(String, String)> {
        ctx.structured
            .iter()
            .map(|raw| (raw.key.to_string(), raw.xml.clone()))
            .collect()
    }

    #[test]
    fn structured_properties_survive_a_rewrite() {
        let (pairs, ctx) = decoded(HISTORY);
        assert_eq!(pairs, vec![pair("Xmp.dc.title", "Pier")]);
        let kept = structured_xml(&ctx);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "Xmp.xmpMM.History");
        assert!(kept[0].1.starts_with("<xmpMM:History>"));
        assert!(kept[0].1.ends_with("</xmpMM:History>"));

        let mut store = MetadataStore::new();
        store.push("Xmp.dc.title".parse().unwrap(), "Pier at dusk");
        let packet = build_packet(&store, &ctx).unwrap().unwrap();
        assert!(packet.contains("xmlns:stEvt=\"http://ns.adobe.com/xap/1.0/sType/ResourceEvent#\""));

        let (reread, reread_ctx) = decoded(&packet);
        assert_eq!(reread, vec![pair("Xmp.dc.title", "Pier at dusk")]);
        assert_eq!(structured_xml(&reread_ctx), kept);
    }

    #[test]
    fn parse_type_resource_is_kept() {
        let (_, ctx) = decoded(SAMPLE);
        let kept = structured_xml(&ctx);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "Xmp.my.location");
        assert!(kept[0].1.contains("<my:city>Oslo</my:city>"));
    }

    #[test]
    fn store_value_replaces_structured_property() {
        let (_, ctx) = decoded(SAMPLE);
        let mut store = MetadataStore::new();
        store.push("Xmp.my.location".parse().unwrap(), "Oslo");
        let packet = build_packet(&store, &ctx).unwrap().unwrap();
        assert!(!packet.contains("parseType"));
        let (reread, _) = decoded(&packet);
        assert_eq!(reread, vec![pair("Xmp.my.location", "Oslo")]);
    }

    #[test]
    fn empty_store_has_no_packet() {
        let ctx = XmpContext::default();
        assert!(build_packet(&MetadataStore::new(), &ctx).unwrap().is_none());
    }

    #[test]
    fn unknown_prefix_cannot_be_written() {
        let mut store = MetadataStore::new();
        store.push("Xmp.nope.thing".parse().unwrap(), "x");
        let err = build_packet(&store, &XmpContext::default()).unwrap_err();
        assert_eq!(err.kind(), EngineErrorKind::InvalidKey);
    }

    #[test]
    fn escape() {
        assert_eq!(xml_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
    }
}
