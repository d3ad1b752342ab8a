//! The friend record.
//!
//! A [`Record`] is one entry in the contact book. Its JSON form is the unit of
//! the persisted file, so the serde attributes here define the on-disk shape.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::Coordinate;

/// A friend entry.
///
/// Two records are equal when every field matches; `id` alone is the stable
/// handle used for lookup and removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Generated once at creation and never changed.
    pub id: Uuid,

    /// Raw photo bytes, base64 in JSON. `None` means use the placeholder.
    #[serde(rename = "imageData", default, with = "image_base64")]
    pub image: Option<Vec<u8>>,

    /// Display name.
    pub name: String,

    /// Phone number, free-form.
    #[serde(rename = "contactNumber")]
    pub contact_number: String,

    /// Social media handle, free-form.
    #[serde(rename = "socialMedia")]
    pub social_handle: String,

    /// Free-text note.
    #[serde(rename = "description")]
    pub note: String,

    /// Latitude where the record was created.
    #[serde(serialize_with = "finite_degrees")]
    pub latitude: f64,

    /// Longitude where the record was created.
    #[serde(serialize_with = "finite_degrees")]
    pub longitude: f64,
}

/// A rendering-ready view of a record's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portrait<'a> {
    /// The embedded photo bytes.
    Photo(&'a [u8]),
    /// No usable photo; render the placeholder.
    Placeholder,
}

impl Record {
    /// Create a record with a freshly generated id.
    #[must_use]
    pub fn new(
        image: Option<Vec<u8>>,
        name: impl Into<String>,
        contact_number: impl Into<String>,
        social_handle: impl Into<String>,
        note: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            name: name.into(),
            contact_number: contact_number.into(),
            social_handle: social_handle.into(),
            note: note.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    /// The position as a [`Coordinate`].
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The image to render. Empty blobs count as absent.
    #[must_use]
    pub fn portrait(&self) -> Portrait<'_> {
        match self.image.as_deref() {
            Some(bytes) if !bytes.is_empty() => Portrait::Photo(bytes),
            _ => Portrait::Placeholder,
        }
    }

    /// Whether the record carries a photo.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        matches!(self.portrait(), Portrait::Photo(_))
    }

    /// Case-insensitive substring match on the name.
    ///
    /// An empty query matches every record.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }

    /// List order: descending by name.
    #[must_use]
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other.name.cmp(&self.name)
    }
}

/// Sort records into list order.
pub fn sort_for_display(records: &mut [Record]) {
    records.sort_by(Record::display_cmp);
}

// JSON has no NaN or infinity; serde_json would silently write `null`,
// leaving a file that no longer decodes.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn finite_degrees<S: serde::Serializer>(degrees: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if degrees.is_finite() {
        serializer.serialize_f64(*degrees)
    } else {
        Err(serde::ser::Error::custom(format!(
            "coordinate {degrees} is not a finite number"
        )))
    }
}

mod image_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        image: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match image {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
