//! WMS GetCapabilities parsing: layer names and their declared bounds.

use foundation::{Crs, Extent};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::FormatError;

/// One `<BoundingBox>` (or 1.1.1 `<LatLonBoundingBox>`) as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredBox {
    /// `CRS` (1.3.0) or `SRS` (1.1.1) attribute, if any.
    pub crs: Option<String>,
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilitiesLayer {
    pub name: Option<String>,
    pub bounding_boxes: Vec<DeclaredBox>,
    /// `EX_GeographicBoundingBox` or `LatLonBoundingBox`, lon/lat order.
    pub geographic: Option<[f64; 4]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    pub version: Option<String>,
    pub layers: Vec<CapabilitiesLayer>,
}

impl Capabilities {
    /// Finds a layer by name. `ws:layer` matches `ws:layer` or `layer`;
    /// failing that, the first layer whose name contains the local part wins.
    pub fn find_layer(&self, qualified: &str) -> Option<&CapabilitiesLayer> {
        let local = qualified.rsplit(':').next().unwrap_or(qualified);
        let named = || self.layers.iter().filter_map(|l| Some((l, l.name.as_deref()?)));

        named()
            .find(|(_, n)| *n == qualified || *n == local)
            .or_else(|| named().find(|(_, n)| n.contains(local)))
            .map(|(l, _)| l)
    }

    /// WGS84 bounds declared for `qualified`, if the layer exists and declares any.
    pub fn declared_extent(&self, qualified: &str) -> Option<Extent> {
        let layer = self.find_layer(qualified)?;
        layer.declared_extent(self.is_1_3())
    }

    fn is_1_3(&self) -> bool {
        self.version.as_deref().is_some_and(|v| v.starts_with("1.3"))
    }
}

impl CapabilitiesLayer {
    /// Preference: `CRS:84` box, geographic box, `EPSG:4326` box (axes
    /// swapped under 1.3.0), then the first box with a reprojectable CRS. A box
    /// without any CRS attribute is read as WGS84.
    pub fn declared_extent(&self, wms_1_3: bool) -> Option<Extent> {
        let crs_of = |b: &DeclaredBox| b.crs.as_deref().map(Crs::parse);

        if let Some(b) = self
            .bounding_boxes
            .iter()
            .find(|b| b.crs.as_deref().is_some_and(|c| c.eq_ignore_ascii_case("CRS:84")))
        {
            return Some(Extent::new(b.minx, b.miny, b.maxx, b.maxy, Crs::Wgs84));
        }

        if let Some([w, s, e, n]) = self.geographic {
            return Some(Extent::new(w, s, e, n, Crs::Wgs84));
        }

        if let Some(b) = self
            .bounding_boxes
            .iter()
            .find(|b| matches!(crs_of(b), Some(Ok(Crs::Wgs84))))
        {
            let extent = if wms_1_3 {
                Extent::new(b.miny, b.minx, b.maxy, b.maxx, Crs::Wgs84)
            } else {
                Extent::new(b.minx, b.miny, b.maxx, b.maxy, Crs::Wgs84)
            };
            return Some(extent);
        }

        self.bounding_boxes.iter().find_map(|b| {
            let crs = match crs_of(b) {
                None => Crs::Wgs84,
                Some(Ok(crs)) => crs,
                Some(Err(_)) => return None,
            };
            Extent::new(b.minx, b.miny, b.maxx, b.maxy, crs)
                .to_geographic()
                .ok()
        })
    }
}

pub fn parse_capabilities(xml: &str) -> Result<Capabilities, FormatError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut caps = Capabilities::default();
    let mut path: Vec<String> = Vec::new();
    let mut open_layers: Vec<CapabilitiesLayer> = Vec::new();
    let mut geo_parts: [Option<f64>; 4] = [None; 4];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "WMS_Capabilities" | "WMT_MS_Capabilities" => {
                        caps.version = attr(&e, "version")?;
                    }
                    "Layer" => open_layers.push(CapabilitiesLayer::default()),
                    "EX_GeographicBoundingBox" => geo_parts = [None; 4],
                    _ => {}
                }
                if parent_is_layer(&path) {
                    attach_box(&e, &name, open_layers.last_mut())?;
                }
                path.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                if parent_is_layer(&path) {
                    attach_box(&e, &name, open_layers.last_mut())?;
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                let text = text.trim();
                match path_tail(&path) {
                    (Some("Layer"), Some("Name")) => {
                        if let Some(layer) = open_layers.last_mut() {
                            layer.name = Some(text.to_string());
                        }
                    }
                    (Some("EX_GeographicBoundingBox"), Some(part)) => {
                        let slot = match part {
                            "westBoundLongitude" => Some(0),
                            "southBoundLatitude" => Some(1),
                            "eastBoundLongitude" => Some(2),
                            "northBoundLatitude" => Some(3),
                            _ => None,
                        };
                        if let Some(slot) = slot {
                            geo_parts[slot] = text.parse().ok();
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                path.pop();
                match name.as_str() {
                    "Layer" => {
                        if let Some(layer) = open_layers.pop() {
                            caps.layers.push(layer);
                        }
                    }
                    "EX_GeographicBoundingBox" => {
                        if let ([Some(w), Some(s), Some(e), Some(n)], Some(layer)) =
                            (geo_parts, open_layers.last_mut())
                        {
                            layer.geographic = Some([w, s, e, n]);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(caps)
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn parent_is_layer(path: &[String]) -> bool {
    path.last().is_some_and(|p| p == "Layer")
}

fn path_tail(path: &[String]) -> (Option<&str>, Option<&str>) {
    let n = path.len();
    let parent = n.checked_sub(2).and_then(|i| path.get(i)).map(String::as_str);
    (parent, path.last().map(String::as_str))
}

fn attr(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, FormatError> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attach_box(
    e: &BytesStart<'_>,
    name: &str,
    layer: Option<&mut CapabilitiesLayer>,
) -> Result<(), FormatError> {
    let Some(layer) = layer else {
        return Ok(());
    };
    if name != "BoundingBox" && name != "LatLonBoundingBox" {
        return Ok(());
    }

    let num = |key: &str| -> Result<Option<f64>, FormatError> {
        Ok(attr(e, key)?.and_then(|v| v.trim().parse().ok()))
    };
    let (Some(minx), Some(miny), Some(maxx), Some(maxy)) =
        (num("minx")?, num("miny")?, num("maxx")?, num("maxy")?)
    else {
        return Ok(());
    };

    if name == "LatLonBoundingBox" {
        layer.geographic = Some([minx, miny, maxx, maxy]);
    } else {
        let crs = match attr(e, "CRS")? {
            Some(c) => Some(c),
            None => attr(e, "SRS")?,
        };
        layer.bounding_boxes.push(DeclaredBox {
            crs,
            minx,
            miny,
            maxx,
            maxy,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_capabilities;
    use foundation::{Crs, Extent};
    use pretty_assertions::assert_eq;

    const CAPS_1_3: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms">
  <Capability>
    <Layer>
      <Title>ws_ranhgioi</Title>
      <Layer queryable="1">
        <Name>rg_vn_tinh</Name>
        <Style><Name>polygon</Name></Style>
        <EX_GeographicBoundingBox>
          <westBoundLongitude>102.14</westBoundLongitude>
          <eastBoundLongitude>109.47</eastBoundLongitude>
          <southBoundLatitude>8.56</southBoundLatitude>
          <northBoundLatitude>23.39</northBoundLatitude>
        </EX_GeographicBoundingBox>
        <BoundingBox CRS="EPSG:4326" minx="8.56" miny="102.14" maxx="23.39" maxy="109.47"/>
      </Layer>
      <Layer queryable="1">
        <Name>rg_vn_xa</Name>
        <BoundingBox CRS="CRS:84" minx="102.1" miny="8.5" maxx="109.5" maxy="23.4"/>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

    #[test]
    fn collects_named_layers_and_boxes() {
        let caps = parse_capabilities(CAPS_1_3).unwrap();
        assert_eq!(caps.version.as_deref(), Some("1.3.0"));
        let names: Vec<_> = caps.layers.iter().filter_map(|l| l.name.clone()).collect();
        assert_eq!(names, vec!["rg_vn_tinh".to_string(), "rg_vn_xa".to_string()]);

        let tinh = caps.find_layer("ws_ranhgioi:rg_vn_tinh").unwrap();
        assert_eq!(tinh.geographic, Some([102.14, 8.56, 109.47, 23.39]));
        assert_eq!(tinh.bounding_boxes.len(), 1);
    }

    #[test]
    fn style_names_do_not_rename_layer() {
        let caps = parse_capabilities(CAPS_1_3).unwrap();
        assert!(caps.find_layer("polygon").is_none());
    }

    #[test]
    fn declared_extent_prefers_crs84() {
        let caps = parse_capabilities(CAPS_1_3).unwrap();
        assert_eq!(
            caps.declared_extent("ws_ranhgioi:rg_vn_xa"),
            Some(Extent::new(102.1, 8.5, 109.5, 23.4, Crs::Wgs84))
        );
        assert_eq!(
            caps.declared_extent("rg_vn_tinh"),
            Some(Extent::new(102.14, 8.56, 109.47, 23.39, Crs::Wgs84))
        );
        assert_eq!(caps.declared_extent("missing"), None);
    }

    #[test]
    fn epsg4326_box_is_axis_swapped_under_1_3() {
        let xml = r#"<WMS_Capabilities version="1.3.0"><Capability><Layer>
            <Name>gardens</Name>
            <BoundingBox CRS="EPSG:4326" minx="10.0" miny="105.0" maxx="11.0" maxy="106.0"/>
        </Layer></Capability></WMS_Capabilities>"#;
        let caps = parse_capabilities(xml).unwrap();
        assert_eq!(
            caps.declared_extent("_2025_EUDR:gardens"),
            Some(Extent::new(105.0, 10.0, 106.0, 11.0, Crs::Wgs84))
        );
    }

    #[test]
    fn box_without_crs_reads_as_wgs84() {
        let xml = r#"<WMT_MS_Capabilities version="1.1.1"><Capability><Layer>
            <Name>ws:plots</Name>
            <BoundingBox minx="1" miny="2" maxx="3" maxy="4"/>
        </Layer></Capability></WMT_MS_Capabilities>"#;
        let caps = parse_capabilities(xml).unwrap();
        assert_eq!(
            caps.declared_extent("ws:plots"),
            Some(Extent::new(1.0, 2.0, 3.0, 4.0, Crs::Wgs84))
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_capabilities("<WMS_Capabilities><Layer></WMS_Capabilities>").is_err());
    }
}
