//! Result export assembly
//!
//! Only matched records are exported. This module decides which records
//! appear in each artifact and with what attributes; the byte-level layout
//! belongs to the sinks behind [`crate::io::FeatureSink`] and
//! [`crate::io::MarkupSink`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::photo::PhotoRecord;

/// Attribute date format for exported features.
pub const FEATURE_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One exported point feature.
///
/// Geometry is a single point at (longitude, latitude), WGS84. Attribute
/// names follow the original survey schema, hence the casing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PointFeature {
    /// Identifier derived from the photo's base name
    pub name: String,
    /// Image reference, present only when thumbnails were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Calibrated local capture time, formatted per [`FEATURE_DATE_FORMAT`]
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The assembled feature collection handed to the vector-file sink.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    pub name: String,
    pub features: Vec<PointFeature>,
}

/// Assemble the point-feature collection for the matched records.
pub fn feature_collection(matched: &[PhotoRecord], thumbnails: bool) -> FeatureCollection {
    let mut features = Vec::with_capacity(matched.len());

    for photo in matched {
        let (Some(latitude), Some(longitude), Some(time)) =
            (photo.latitude(), photo.longitude(), photo.calibrated_time())
        else {
            continue;
        };

        features.push(PointFeature {
            name: photo.base_name(),
            image: thumbnails.then(|| photo.file_name()),
            date: time.format(FEATURE_DATE_FORMAT).to_string(),
            latitude,
            longitude,
        });
    }

    FeatureCollection {
        name: "Photos".to_string(),
        features,
    }
}

/// Render the scene-markup (KML) document for the matched records.
///
/// One placemark per photo: sanitized name, an embedded-image description,
/// a look-at viewpoint centred on the point, and coordinates at 16
/// fractional digits so sub-meter positions survive the round trip through
/// text.
pub fn markup_document(project_name: &str, matched: &[PhotoRecord]) -> String {
    let mut doc = String::new();

    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\"");
    doc.push_str(" xmlns:gx=\"http://www.google.com/kml/ext/2.2\"");
    doc.push_str(" xmlns:kml=\"http://www.opengis.net/kml/2.2\"");
    doc.push_str(" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    doc.push_str("<Document>\n");
    let _ = writeln!(doc, "\t<name>{}</name>", xml_sanitize(project_name));
    doc.push_str("\t<Style id=\"sn_placemark_circle\">\n");
    doc.push_str("\t\t<IconStyle>\n");
    doc.push_str("\t\t\t<color>ff00ffff</color>\n");
    doc.push_str("\t\t\t<scale>0.8</scale>\n");
    doc.push_str("\t\t\t<Icon>\n");
    doc.push_str(
        "\t\t\t\t<href>http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png</href>\n",
    );
    doc.push_str("\t\t\t</Icon>\n");
    doc.push_str("\t\t</IconStyle>\n");
    doc.push_str("\t\t<LabelStyle>\n");
    doc.push_str("\t\t\t<scale>0</scale>\n");
    doc.push_str("\t\t</LabelStyle>\n");
    doc.push_str("\t\t<ListStyle>\n");
    doc.push_str("\t\t</ListStyle>\n");
    doc.push_str("\t</Style>\n");
    doc.push_str("\t<StyleMap id=\"msn_placemark_circle\">\n");
    doc.push_str("\t\t<Pair>\n");
    doc.push_str("\t\t\t<key>normal</key>\n");
    doc.push_str("\t\t\t<styleUrl>#sn_placemark_circle</styleUrl>\n");
    doc.push_str("\t\t</Pair>\n");
    doc.push_str("\t\t<Pair>\n");
    doc.push_str("\t\t\t<key>highlight</key>\n");
    doc.push_str("\t\t\t<styleUrl>#sh_placemark_circle_highlight</styleUrl>\n");
    doc.push_str("\t\t</Pair>\n");
    doc.push_str("\t</StyleMap>\n");
    doc.push_str("\t<Style id=\"sh_placemark_circle_highlight\">\n");
    doc.push_str("\t\t<IconStyle>\n");
    doc.push_str("\t\t\t<color>ff00ffff</color>\n");
    doc.push_str("\t\t\t<scale>1.0</scale>\n");
    doc.push_str("\t\t\t<Icon>\n");
    doc.push_str(
        "\t\t\t\t<href>http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png</href>\n",
    );
    doc.push_str("\t\t\t</Icon>\n");
    doc.push_str("\t\t</IconStyle>\n");
    doc.push_str("\t\t<ListStyle>\n");
    doc.push_str("\t\t</ListStyle>\n");
    doc.push_str("\t</Style>\n");

    for photo in matched {
        let (Some(latitude), Some(longitude)) = (photo.latitude(), photo.longitude()) else {
            continue;
        };

        doc.push_str("\t<Placemark>\n");
        let _ = writeln!(doc, "\t\t<name>{}</name>", xml_sanitize(&photo.base_name()));
        let _ = writeln!(
            doc,
            "\t\t<description><![CDATA[<img src=\"{}\"/>]]></description>",
            photo.file_name()
        );
        doc.push_str("\t\t<LookAt>\n");
        let _ = writeln!(doc, "\t\t\t<longitude>{:.16}</longitude>", longitude);
        let _ = writeln!(doc, "\t\t\t<latitude>{:.16}</latitude>", latitude);
        doc.push_str("\t\t\t<altitude>0</altitude>\n");
        doc.push_str("\t\t\t<heading>0</heading>\n");
        doc.push_str("\t\t\t<tilt>0</tilt>\n");
        doc.push_str("\t\t\t<range>300</range>\n");
        doc.push_str("\t\t\t<gx:altitudeMode>relativeToSeaFloor</gx:altitudeMode>\n");
        doc.push_str("\t\t</LookAt>\n");
        doc.push_str("\t\t<styleUrl>#msn_placemark_circle</styleUrl>\n");
        doc.push_str("\t\t<Point>\n");
        doc.push_str("\t\t\t<gx:drawOrder>1</gx:drawOrder>\n");
        let _ = writeln!(
            doc,
            "\t\t\t<coordinates>{:.16},{:.16},0</coordinates>",
            longitude, latitude
        );
        doc.push_str("\t\t</Point>\n");
        doc.push_str("\t</Placemark>\n");
    }

    doc.push_str("</Document>\n");
    doc.push_str("</kml>\n");

    doc
}

/// Strip control characters and escape markup metacharacters for element
/// text.
fn xml_sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Calibration;
    use crate::position::Coordinates;
    use chrono::{Local, TimeZone};

    fn matched_photo(name: &str, latitude: f64, longitude: f64) -> PhotoRecord {
        let reference = Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let calibration = Calibration::from_reference(reference, "2021-06-01 12:00:00").unwrap();
        let mut record = PhotoRecord::calibrated(name, reference, &calibration);
        record.resolve(Coordinates {
            latitude,
            longitude,
        });
        record
    }

    #[test]
    fn features_carry_names_dates_and_positions() {
        let photos = vec![matched_photo("trip/IMG_0001.jpg", -25.5, 120.25)];

        let collection = feature_collection(&photos, false);

        assert_eq!(collection.name, "Photos");
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.name, "IMG_0001");
        assert_eq!(feature.image, None);
        assert_eq!(feature.date, "01/06/2021 12:00:00");
        assert_eq!(feature.latitude, -25.5);
        assert_eq!(feature.longitude, 120.25);
    }

    #[test]
    fn image_attribute_present_only_with_thumbnails() {
        let photos = vec![matched_photo("IMG_0001.jpg", 0.0, 0.0)];

        let with = feature_collection(&photos, true);
        assert_eq!(with.features[0].image.as_deref(), Some("IMG_0001.jpg"));

        let without = feature_collection(&photos, false);
        assert_eq!(without.features[0].image, None);

        // And the serialized form omits the attribute entirely
        let json = serde_json::to_value(&without.features[0]).unwrap();
        assert!(json.get("Image").is_none());
        assert_eq!(json["Name"], "IMG_0001");
        assert_eq!(json["Latitude"], 0.0);
    }

    #[test]
    fn unmatched_records_are_never_exported() {
        let photos = vec![PhotoRecord::new("IMG_0001.jpg")];

        assert!(feature_collection(&photos, false).features.is_empty());
        assert!(!markup_document("Trip", &photos).contains("<Placemark>"));
    }

    #[test]
    fn markup_contains_one_placemark_per_photo() {
        let photos = vec![
            matched_photo("IMG_0001.jpg", 0.5, 0.5),
            matched_photo("IMG_0002.jpg", 1.0, 1.0),
        ];

        let doc = markup_document("Field Trip", &photos);

        assert_eq!(doc.matches("<Placemark>").count(), 2);
        assert!(doc.contains("<name>Field Trip</name>"));
        assert!(doc.contains("<name>IMG_0001</name>"));
        assert!(doc.contains("<img src=\"IMG_0002.jpg\"/>"));
        assert!(doc.contains("<range>300</range>"));
    }

    #[test]
    fn markup_coordinates_use_sixteen_fractional_digits() {
        let photos = vec![matched_photo("IMG_0001.jpg", 0.5, 0.25)];

        let doc = markup_document("Trip", &photos);

        assert!(doc.contains("<coordinates>0.2500000000000000,0.5000000000000000,0</coordinates>"));
    }

    #[test]
    fn empty_matched_set_yields_well_formed_document() {
        let doc = markup_document("Trip", &[]);

        assert!(doc.starts_with("<?xml version=\"1.0\""));
        assert!(doc.ends_with("</kml>\n"));
        assert!(!doc.contains("<Placemark>"));
    }

    #[test]
    fn names_are_sanitized_for_markup() {
        let photos = vec![matched_photo("a<b>&c.jpg", 0.0, 0.0)];

        let doc = markup_document("P & Q", &photos);

        assert!(doc.contains("<name>P &amp; Q</name>"));
        assert!(doc.contains("<name>a&lt;b&gt;&amp;c</name>"));
    }
}
