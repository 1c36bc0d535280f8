// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Marker data model.
//!
//! A [`Marker`] pins one uploaded photo ([`MediaRef`]) to one [`Coordinate`].
//! Markers are immutable once built: the cache only ever appends or replaces
//! them wholesale, never edits one in place.
//!
//! # Example
//!
//! ```
//! use geomark_sync::Coordinate;
//!
//! let copenhagen = Coordinate::new(55.6761, 12.5683).unwrap();
//! assert_eq!(copenhagen.latitude(), 55.6761);
//!
//! assert!(Coordinate::new(200.0, 12.5683).is_err());
//! assert!(Coordinate::new(f64::NAN, 0.0).is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// A validated (latitude, longitude) pair in decimal degrees.
///
/// Construct through [`Coordinate::new`]; the fields are private so an
/// out-of-range value can never reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = UploadError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Default map centre.
    pub const COPENHAGEN: Coordinate = Coordinate {
        latitude: 55.6761,
        longitude: 12.5683,
    };

    /// Validate and build a coordinate.
    ///
    /// Both values must be finite, latitude within [-90, 90] and longitude
    /// within [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, UploadError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(UploadError::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Opaque locator for stored media bytes.
///
/// Only a [`MediaStore`](crate::storage::traits::MediaStore) produces these,
/// after the bytes behind it have been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    /// Wrap a locator string. Store implementations call this once the
    /// upload behind `locator` has completed.
    pub fn from_store(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the metadata store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A coordinate with an uploaded photo attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub coordinate: Coordinate,
    pub media: MediaRef,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
}

impl Marker {
    /// Build the local marker for a record the metadata store has accepted.
    pub fn from_record(id: MarkerId, record: NewMarkerRecord) -> Self {
        Self {
            id,
            coordinate: record.coordinate,
            media: record.media,
            created_at: record.created_at,
        }
    }
}

/// Document written to the metadata store.
///
/// Serialized flat as `{latitude, longitude, imageURL, createdAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarkerRecord {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(rename = "imageURL")]
    pub media: MediaRef,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl NewMarkerRecord {
    pub fn new(coordinate: Coordinate, media: MediaRef) -> Self {
        Self {
            coordinate,
            media,
            created_at: now_millis(),
        }
    }
}

/// Document read back from the metadata store listing.
///
/// The coordinate is kept raw: stored documents are not trusted to be valid
/// and are checked by [`MarkerRecord::into_marker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "imageURL")]
    pub media: MediaRef,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl MarkerRecord {
    pub fn into_marker(self) -> Result<Marker, UploadError> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)?;
        Ok(Marker {
            id: self.id,
            coordinate,
            media: self.media,
            created_at: self.created_at,
        })
    }
}

/// What the image picker handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// The user picked a photo; these are its bytes.
    Picked(Vec<u8>),
    /// The user closed the picker without choosing.
    Cancelled,
    /// Media library access was refused.
    PermissionDenied,
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
