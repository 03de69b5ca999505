//! Suppliers of map imagery.
//!
//! The synchronizer never draws tiles itself, it only needs to know where they
//! come from. Which supplier is used is a matter of configuration.
use crate::{
    error::{Error, Result},
    record::LngLat,
};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, fmt::Debug};

pub const OSM_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
const MAPBOX_ATTRIBUTION: &str = "© Mapbox © OpenStreetMap contributors";

pub trait TileProvider: Debug + Send + Sync {
    /// A short name for the provider, for display
    fn name(&self) -> &str;

    /// The url of the image tile at zoom level `z`
    fn tile_url(&self, z: u8, x: u32, y: u32) -> String;

    /// Width and height of a tile in pixels
    fn tile_size(&self) -> u32;

    fn attribution(&self) -> &str;

    fn max_zoom(&self) -> u8 {
        22
    }
}

/// Raster tiles from a `{z}/{x}/{y}` url template
#[derive(Debug, Clone, PartialEq)]
pub struct RasterTiles {
    template: String,
    tile_size: u32,
    attribution: String,
    max_zoom: u8,
}

impl Default for RasterTiles {
    fn default() -> Self {
        Self {
            template: OSM_TEMPLATE.to_string(),
            tile_size: 256,
            attribution: OSM_ATTRIBUTION.to_string(),
            max_zoom: 19,
        }
    }
}

impl TileProvider for RasterTiles {
    fn name(&self) -> &str {
        "raster"
    }

    fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    fn tile_size(&self) -> u32 {
        self.tile_size
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}

/// Tiles rendered from a hosted vector style. Requires an access token.
#[derive(Clone, PartialEq)]
pub struct VectorTiles {
    style: String,
    access_token: String,
}

impl Debug for VectorTiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorTiles")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl TileProvider for VectorTiles {
    fn name(&self) -> &str {
        "vector"
    }

    fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        format!(
            "https://api.mapbox.com/styles/v1/{}/tiles/{}/{z}/{x}/{y}?access_token={}",
            self.style,
            self.tile_size(),
            self.access_token
        )
    }

    fn tile_size(&self) -> u32 {
        512
    }

    fn attribution(&self) -> &str {
        MAPBOX_ATTRIBUTION
    }
}

fn default_tile_size() -> u32 {
    256
}

fn default_attribution() -> String {
    OSM_ATTRIBUTION.to_string()
}

fn default_max_zoom() -> u8 {
    19
}

fn default_style() -> String {
    "mapbox/light-v11".to_string()
}

/// Configuration for choosing a [TileProvider]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum TileConfig {
    Raster {
        template: String,
        #[serde(default = "default_tile_size")]
        tile_size: u32,
        #[serde(default = "default_attribution")]
        attribution: String,
        #[serde(default = "default_max_zoom")]
        max_zoom: u8,
    },
    Vector {
        #[serde(default = "default_style")]
        style: String,
        access_token: String,
    },
}

impl Default for TileConfig {
    fn default() -> Self {
        Self::Raster {
            template: OSM_TEMPLATE.to_string(),
            tile_size: default_tile_size(),
            attribution: default_attribution(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl TileConfig {
    pub fn build(&self) -> Result<Box<dyn TileProvider>> {
        match self {
            TileConfig::Raster {
                template,
                tile_size,
                attribution,
                max_zoom,
            } => {
                if let Some(missing) = ["{z}", "{x}", "{y}"]
                    .into_iter()
                    .find(|p| !template.contains(p))
                {
                    return Err(Error::InvalidConfiguration(format!(
                        "tile template '{template}' has no {missing} placeholder"
                    )));
                }
                Ok(Box::new(RasterTiles {
                    template: template.clone(),
                    tile_size: *tile_size,
                    attribution: attribution.clone(),
                    max_zoom: *max_zoom,
                }))
            }
            TileConfig::Vector {
                style,
                access_token,
            } => {
                if access_token.trim().is_empty() {
                    return Err(Error::InvalidConfiguration(
                        "vector tiles require an access token".to_string(),
                    ));
                }
                Ok(Box::new(VectorTiles {
                    style: style.clone(),
                    access_token: access_token.trim().to_string(),
                }))
            }
        }
    }
}

/// The part of the world that is shown when a map is first mounted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: LngLat,
    pub zoom: u8,
}

impl Default for MapView {
    /// Central Asia, where the old silk road routes meet
    fn default() -> Self {
        Self {
            center: LngLat::new(65.0, 35.0),
            zoom: 2,
        }
    }
}

/// The web-mercator tile containing `position` at zoom level `zoom`
pub fn tile_at(position: LngLat, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom.min(31));
    let lat = position.lat.clamp(-85.05112878, 85.05112878).to_radians();
    let x = (position.lng + 180.0) / 360.0 * n;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}
