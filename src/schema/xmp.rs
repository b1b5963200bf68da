//! XMP namespaces and common properties.

use super::{TagInfo, label_from_name};
use crate::key::{Family, TagKey};

/// Shape of an XMP property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmpKind {
    Text,
    /// Unordered array (`rdf:Bag`).
    Bag,
    /// Ordered array (`rdf:Seq`).
    Seq,
    /// Language alternatives (`rdf:Alt` with `xml:lang`).
    LangAlt,
}

impl XmpKind {
    pub fn type_name(self) -> &'static str {
        match self {
            XmpKind::Text => "XmpText",
            XmpKind::Bag => "XmpBag",
            XmpKind::Seq => "XmpSeq",
            XmpKind::LangAlt => "LangAlt",
        }
    }

    pub fn repeatable(self) -> bool {
        matches!(self, XmpKind::Bag | XmpKind::Seq)
    }
}

pub(crate) const NAMESPACES: &[(&str, &str)] = &[
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("xmp", "http://ns.adobe.com/xap/1.0/"),
    ("xmpRights", "http://ns.adobe.com/xap/1.0/rights/"),
    ("xmpMM", "http://ns.adobe.com/xap/1.0/mm/"),
    ("photoshop", "http://ns.adobe.com/photoshop/1.0/"),
    ("Iptc4xmpCore", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/"),
    ("tiff", "http://ns.adobe.com/tiff/1.0/"),
    ("exif", "http://ns.adobe.com/exif/1.0/"),
    ("lr", "http://ns.adobe.com/lightroom/1.0/"),
    ("crs", "http://ns.adobe.com/camera-raw-settings/1.0/"),
];

/// `(prefix, name, kind, description)`
const PROPERTIES: &[(&str, &str, XmpKind, &str)] = &[
    ("dc", "title", XmpKind::LangAlt, "The title of the document, or the name given to the resource."),
    ("dc", "description", XmpKind::LangAlt, "A textual description of the content of the resource."),
    ("dc", "rights", XmpKind::LangAlt, "Informal rights statement."),
    ("dc", "subject", XmpKind::Bag, "Descriptive phrases or keywords that specify the topic of the content."),
    ("dc", "creator", XmpKind::Seq, "The authors of the resource, listed in order of precedence."),
    ("dc", "contributor", XmpKind::Bag, "Contributors to the resource other than the authors."),
    ("dc", "publisher", XmpKind::Bag, "Publishers of the resource."),
    ("dc", "date", XmpKind::Seq, "Dates associated with events in the life cycle of the resource."),
    ("dc", "type", XmpKind::Bag, "The nature or genre of the resource."),
    ("dc", "language", XmpKind::Bag, "Languages used in the content of the resource."),
    ("dc", "relation", XmpKind::Bag, "Relationships to other documents."),
    ("dc", "format", XmpKind::Text, "The file format used when saving the resource."),
    ("dc", "identifier", XmpKind::Text, "Unique identifier of the resource."),
    ("dc", "source", XmpKind::Text, "Unique identifier of the work from which this resource was derived."),
    ("dc", "coverage", XmpKind::Text, "The extent or scope of the resource."),
    ("xmp", "CreateDate", XmpKind::Text, "The date and time the resource was originally created."),
    ("xmp", "ModifyDate", XmpKind::Text, "The date and time the resource was last modified."),
    ("xmp", "MetadataDate", XmpKind::Text, "The date and time that any metadata for this resource was last changed."),
    ("xmp", "CreatorTool", XmpKind::Text, "The name of the first known tool used to create the resource."),
    ("xmp", "Rating", XmpKind::Text, "A number that indicates a document's status relative to other documents."),
    ("xmp", "Label", XmpKind::Text, "A word or short phrase that identifies a document as a member of a user-defined collection."),
    ("xmp", "Identifier", XmpKind::Bag, "Unambiguous identifiers of the resource within a given context."),
    ("xmpRights", "Marked", XmpKind::Text, "Whether this is a rights-managed resource."),
    ("xmpRights", "WebStatement", XmpKind::Text, "The location of a web page describing the owner and rights statement."),
    ("xmpRights", "UsageTerms", XmpKind::LangAlt, "Instructions on how the resource can be legally used."),
    ("xmpRights", "Owner", XmpKind::Bag, "Legal owners of the resource."),
    ("photoshop", "Headline", XmpKind::Text, "A publishable entry providing a synopsis of the contents of the image."),
    ("photoshop", "City", XmpKind::Text, "Name of the city where the image was created."),
    ("photoshop", "State", XmpKind::Text, "Name of the subregion of a country."),
    ("photoshop", "Country", XmpKind::Text, "Full name of the country where the image was created."),
    ("photoshop", "Credit", XmpKind::Text, "The credit to person(s) and/or organisation(s) required by the supplier."),
    ("photoshop", "Source", XmpKind::Text, "The name of a person or party who has a role in the content supply chain."),
    ("photoshop", "Instructions", XmpKind::Text, "Any of a number of instructions from the provider or creator to the receiver."),
    ("photoshop", "CaptionWriter", XmpKind::Text, "Identifier or name of the person involved in writing the description."),
    ("photoshop", "AuthorsPosition", XmpKind::Text, "The job title of the creator."),
    ("photoshop", "TransmissionReference", XmpKind::Text, "An identifier for the purpose of improved workflow handling."),
    ("photoshop", "DateCreated", XmpKind::Text, "The date the intellectual content of the image was created."),
    ("photoshop", "Urgency", XmpKind::Text, "Editorial urgency of the content."),
    ("photoshop", "Category", XmpKind::Text, "Subject category of the content."),
    ("photoshop", "SupplementalCategories", XmpKind::Bag, "Further refinements of the subject category."),
    ("Iptc4xmpCore", "Location", XmpKind::Text, "Name of a sublocation the content is focussing on."),
    ("Iptc4xmpCore", "CountryCode", XmpKind::Text, "Code of the country the content is focussing on."),
    ("Iptc4xmpCore", "IntellectualGenre", XmpKind::Text, "Describes the nature, intellectual or journalistic characteristic of an item."),
    ("Iptc4xmpCore", "Scene", XmpKind::Bag, "Describes the scene of a photo content."),
    ("Iptc4xmpCore", "SubjectCode", XmpKind::Bag, "Specifies one or more subjects from the IPTC subject-newscodes taxonomy."),
    ("tiff", "Make", XmpKind::Text, "Manufacturer of recording equipment."),
    ("tiff", "Model", XmpKind::Text, "Model name or number of equipment."),
    ("tiff", "Orientation", XmpKind::Text, "Orientation of the image."),
    ("exif", "DateTimeOriginal", XmpKind::Text, "Date and time when the original image was generated."),
    ("lr", "hierarchicalSubject", XmpKind::Bag, "Hierarchical keywords, levels separated by '|'."),
];

pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

pub fn prefix_for_uri(uri: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|(_, u)| *u == uri)
        .map(|(prefix, _)| *prefix)
}

/// Kind of a well-known property.
pub fn known_kind(prefix: &str, name: &str) -> Option<XmpKind> {
    PROPERTIES
        .iter()
        .find(|(p, n, ..)| *p == prefix && *n == name)
        .map(|(_, _, kind, _)| *kind)
}

/// Tag info for a property of the given kind.
pub fn info_for(key: &TagKey, kind: XmpKind) -> TagInfo {
    let description = PROPERTIES
        .iter()
        .find(|(p, n, ..)| *p == key.group() && *n == key.name())
        .map_or("", |(.., d)| *d);
    TagInfo::new(
        key.name(),
        &label_from_name(key.name()),
        description,
        kind.type_name(),
        kind.repeatable(),
    )
}

/// Properties of a known namespace resolve; unlisted ones are plain text.
pub fn lookup(key: &TagKey) -> Option<TagInfo> {
    if key.family() != Family::Xmp {
        return None;
    }
    namespace_uri(key.group())?;
    let kind = known_kind(key.group(), key.name()).unwrap_or(XmpKind::Text);
    Some(info_for(key, kind))
}
