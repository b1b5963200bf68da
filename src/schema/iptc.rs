//! IPTC-IIM dataset table (records 1 and 2).

use super::{TagInfo, label_from_name};
use crate::key::{Family, TagKey};

/// Value type of an IIM dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IptcType {
    String,
    Short,
    /// `CCYYMMDD` on disk, `YYYY-MM-DD` in stores.
    Date,
    /// `HHMMSS±HHMM` on disk, `HH:MM:SS±HH:MM` in stores.
    Time,
    Undefined,
}

impl IptcType {
    pub fn type_name(self) -> &'static str {
        match self {
            IptcType::String => "String",
            IptcType::Short => "Short",
            IptcType::Date => "Date",
            IptcType::Time => "Time",
            IptcType::Undefined => "Undefined",
        }
    }
}

#[derive(Debug)]
pub struct Dataset {
    pub record: u8,
    pub number: u8,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: IptcType,
    pub repeatable: bool,
}

const fn ds(
    record: u8,
    number: u8,
    name: &'static str,
    title: &'static str,
    description: &'static str,
    kind: IptcType,
    repeatable: bool,
) -> Dataset {
    Dataset {
        record,
        number,
        name,
        title,
        description,
        kind,
        repeatable,
    }
}

pub const ENVELOPE: u8 = 1;
pub const APPLICATION2: u8 = 2;

use IptcType::{Date, Short, String as Str, Time, Undefined};

pub(crate) const DATASETS: &[Dataset] = &[
    ds(1, 0, "ModelVersion", "Model Version", "Version of the IIM envelope record.", Short, false),
    ds(1, 5, "Destination", "Destination", "Routing information.", Str, true),
    ds(1, 20, "FileFormat", "File Format", "File format of the object data.", Short, false),
    ds(1, 22, "FileVersion", "File Version", "Version of the file format.", Short, false),
    ds(1, 30, "ServiceId", "Service ID", "Identifies the provider and product.", Str, false),
    ds(1, 40, "EnvelopeNumber", "Envelope Number", "Unique number of the envelope.", Str, false),
    ds(1, 50, "ProductId", "Product ID", "Subset of provider's overall service.", Str, true),
    ds(1, 60, "EnvelopePriority", "Envelope Priority", "Envelope handling priority.", Str, false),
    ds(1, 70, "DateSent", "Date Sent", "Date the service sent the material.", Date, false),
    ds(1, 80, "TimeSent", "Time Sent", "Time the service sent the material.", Time, false),
    ds(1, 90, "CharacterSet", "Coded Character Set", "Control functions used for announcement, invocation or designation of coded character sets.", Undefined, false),
    ds(1, 100, "UNO", "Unique Name Of Object", "Eternal, globally unique identification for the object.", Str, false),
    ds(2, 0, "RecordVersion", "Record Version", "Version of the IIM application record.", Short, false),
    ds(2, 5, "ObjectName", "Object Name", "Shorthand reference for the object.", Str, false),
    ds(2, 7, "EditStatus", "Edit Status", "Status of the object data according to the practice of the provider.", Str, false),
    ds(2, 10, "Urgency", "Urgency", "Editorial urgency of content.", Str, false),
    ds(2, 12, "Subject", "Subject", "Structured definition of the subject matter.", Str, true),
    ds(2, 15, "Category", "Category", "Subject of the object data in the opinion of the provider.", Str, false),
    ds(2, 20, "SuppCategory", "Supplemental Category", "Further refines the subject of the object data.", Str, true),
    ds(2, 22, "FixtureId", "Fixture Id", "Identifies object data that recurs often and predictably.", Str, false),
    ds(2, 25, "Keywords", "Keywords", "Keywords to express the subject of the content.", Str, true),
    ds(2, 26, "LocationCode", "Location Code", "Country or geographical location code.", Str, true),
    ds(2, 27, "LocationName", "Location Name", "Full name of a country or geographical location.", Str, true),
    ds(2, 30, "ReleaseDate", "Release Date", "Earliest date the provider intends the object to be used.", Date, false),
    ds(2, 35, "ReleaseTime", "Release Time", "Earliest time the provider intends the object to be used.", Time, false),
    ds(2, 37, "ExpirationDate", "Expiration Date", "Latest date the provider intends the object to be used.", Date, false),
    ds(2, 38, "ExpirationTime", "Expiration Time", "Latest time the provider intends the object to be used.", Time, false),
    ds(2, 40, "SpecialInstructions", "Special Instructions", "Other editorial instructions concerning the use of the object.", Str, false),
    ds(2, 55, "DateCreated", "Date Created", "Date the intellectual content of the object was created.", Date, false),
    ds(2, 60, "TimeCreated", "Time Created", "Time the intellectual content of the object was created.", Time, false),
    ds(2, 62, "DigitizationDate", "Digitization Date", "Date the digital representation of the object was created.", Date, false),
    ds(2, 63, "DigitizationTime", "Digitization Time", "Time the digital representation of the object was created.", Time, false),
    ds(2, 65, "Program", "Program", "Program used to create the object data.", Str, false),
    ds(2, 70, "ProgramVersion", "Program Version", "Version of the program.", Str, false),
    ds(2, 75, "ObjectCycle", "Object Cycle", "Editorial cycle of the object data.", Str, false),
    ds(2, 80, "Byline", "By-line", "Name of the creator of the object.", Str, true),
    ds(2, 85, "BylineTitle", "By-line Title", "Title of the creator or creators of the object.", Str, true),
    ds(2, 90, "City", "City", "City of object origin.", Str, false),
    ds(2, 92, "SubLocation", "Sub Location", "Location within a city from which the object originates.", Str, false),
    ds(2, 95, "ProvinceState", "Province State", "Province or state of object origin.", Str, false),
    ds(2, 100, "CountryCode", "Country Code", "Code of the country of object origin.", Str, false),
    ds(2, 101, "CountryName", "Country Name", "Full name of the country of object origin.", Str, false),
    ds(2, 103, "TransmissionReference", "Transmission Reference", "Code representing the location of original transmission.", Str, false),
    ds(2, 105, "Headline", "Headline", "Synopsis of the contents of the object data.", Str, false),
    ds(2, 110, "Credit", "Credit", "Provider of the object data.", Str, false),
    ds(2, 115, "Source", "Source", "Original owner of the intellectual content.", Str, false),
    ds(2, 116, "Copyright", "Copyright", "Copyright notice.", Str, false),
    ds(2, 118, "Contact", "Contact", "Person or organisation who can provide further background information.", Str, true),
    ds(2, 120, "Caption", "Caption", "Textual description of the object data.", Str, false),
    ds(2, 122, "Writer", "Writer", "Name of the person involved in writing the caption.", Str, true),
    ds(2, 135, "LanguageId", "Language Identifier", "Major national language of the object.", Str, false),
];

pub fn record_name(record: u8) -> Option<&'static str> {
    match record {
        ENVELOPE => Some("Envelope"),
        APPLICATION2 => Some("Application2"),
        _ => None,
    }
}

pub fn record_number(name: &str) -> Option<u8> {
    match name {
        "Envelope" => Some(ENVELOPE),
        "Application2" => Some(APPLICATION2),
        _ => None,
    }
}

pub fn by_number(record: u8, number: u8) -> Option<&'static Dataset> {
    DATASETS
        .iter()
        .find(|d| d.record == record && d.number == number)
}

/// `(record, dataset)` for a key, accepting `0xNNNN` dataset names.
pub fn resolve(key: &TagKey) -> Option<(u8, u8)> {
    if key.family() != Family::Iptc {
        return None;
    }
    let record = record_number(key.group())?;
    if let Some(d) = DATASETS
        .iter()
        .find(|d| d.record == record && d.name == key.name())
    {
        return Some((record, d.number));
    }
    let hex = key
        .name()
        .strip_prefix("0x")
        .or_else(|| key.name().strip_prefix("0X"))?;
    let number = u16::from_str_radix(hex, 16).ok()?;
    u8::try_from(number).ok().map(|n| (record, n))
}

/// Canonical key for a dataset; unknown datasets get a `0xNNNN` name.
pub fn key_for(record: u8, number: u8) -> TagKey {
    let group = record_name(record)
        .map(str::to_string)
        .unwrap_or_else(|| format!("0x{record:04x}"));
    let name = by_number(record, number)
        .map(|d| d.name.to_string())
        .unwrap_or_else(|| format!("0x{number:04x}"));
    TagKey::new(Family::Iptc, group, name)
}

/// Value type of a dataset, `String` when unknown.
pub fn kind_of(record: u8, number: u8) -> IptcType {
    by_number(record, number).map_or(IptcType::String, |d| d.kind)
}

pub fn lookup(key: &TagKey) -> Option<TagInfo> {
    let (record, number) = resolve(key)?;
    Some(match by_number(record, number) {
        Some(d) => TagInfo::new(d.name, d.title, d.description, d.kind.type_name(), d.repeatable),
        None => {
            let name = format!("0x{number:04x}");
            TagInfo::new(
                &name,
                &label_from_name(&name),
                "Unknown dataset",
                IptcType::String.type_name(),
                true,
            )
        }
    })
}
