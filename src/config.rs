//! TOML configuration: the scanner, the image, and which projection matrix,
//! symmetries and row cache to use.
//!
//! ```toml
//! [scanner]
//! num_rings = 4
//! num_views = 8
//! max_tangential_pos_num = 3
//! max_segment_num = 1
//! ring_radius = "60 mm"
//! ring_spacing = "4 mm"
//! tangential_bin_size = "3.3 mm"
//!
//! [image]
//! nvoxels = [5, 5, 4]
//! fov_size = ["40 mm", "40 mm", "16 mm"]
//!
//! [matrix]
//! type = "ray tracing"
//! symmetries = "cartesian grid"
//! generators = { reflect_axial = false }
//! cache = { capacity = 100000 }
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, de};

use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::image::Image;
use crate::projdata::{ProjDataInfo, Scanner};
use crate::projector::{MatrixBackProjector, MatrixForwardProjector};
use crate::projmatrix::{CacheConfig, ProjMatrixByBin, SymmetryChoice};
use crate::registry;
use crate::rejection::RandomRejection;
use crate::symmetries::SymmetryConfig;
use crate::types::Length;

pub(crate) fn deserialize_uom<'d, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    <&str>::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

fn deserialize_uom_3d<'d, D, T>(deserializer: D) -> std::result::Result<(T, T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y, z) = <(&str, &str, &str)>::deserialize(deserializer)?;
    tr_tup_res((x.parse(), y.parse(), z.parse())).map_err(de::Error::custom)
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_tup_res<O, E>((x,y,z): (std::result::Result<O, E>, std::result::Result<O, E>, std::result::Result<O, E>)) -> std::result::Result<(O, O, O), E> {
    Ok((x?, y?, z?))
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub scanner: Scanner,
    pub image: ImageConfig,
    #[serde(default)]
    pub matrix: MatrixConfig,
    /// Random rejection of list-mode events, if any
    pub rejection: Option<RandomRejection>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    pub nvoxels: (usize, usize, usize),

    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub fov_size: (Length, Length, Length),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MatrixConfig {
    /// Registered name of the projection matrix
    #[serde(rename = "type", default = "default_matrix")]
    pub kind: String,

    /// Registered name of the symmetries
    #[serde(default = "default_symmetries")]
    pub symmetries: String,

    #[serde(default)]
    pub generators: SymmetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_matrix() -> String { "ray tracing".into() }
fn default_symmetries() -> String { SymmetryChoice::default().symmetries }

impl Default for MatrixConfig {
    fn default() -> Self {
        Self { kind: default_matrix(), symmetries: default_symmetries(),
               generators: SymmetryConfig::default(), cache: CacheConfig::default() }
    }
}

impl ImageConfig {
    pub fn fov(&self) -> FOV { FOV::new(self.fov_size, self.nvoxels) }
}

impl Config {

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|e| ProjError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ProjDataInfo::new(self.scanner.clone())?;
        self.image.fov().check_valid().map_err(|e| ProjError::Config(e.to_string()))?;
        if let Some(rejection) = &self.rejection { rejection.set_up()? }
        self.matrix.cache.check_valid()?;
        Ok(())
    }

    pub fn proj_data_info(&self) -> Result<Arc<ProjDataInfo>> {
        Ok(Arc::new(ProjDataInfo::new(self.scanner.clone())?))
    }

    pub fn fov(&self) -> FOV { self.image.fov() }

    /// The configured matrix, not yet set up
    pub fn matrix(&self) -> Result<Box<dyn ProjMatrixByBin>> {
        let MatrixConfig { kind, symmetries, generators, cache } = &self.matrix;
        let symmetries = SymmetryChoice { symmetries: symmetries.clone(), generators: *generators };
        registry::make_matrix(kind, symmetries, *cache)
    }

    /// A back projector set up for the configured geometry, and an empty
    /// image to back project into
    pub fn back_projector(&self) -> Result<(MatrixBackProjector, Image)> {
        let image = Image::zeros(self.fov());
        let mut projector = MatrixBackProjector::new(self.matrix()?);
        projector.set_up(self.proj_data_info()?, &image)?;
        Ok((projector, image))
    }

    pub fn forward_projector(&self) -> Result<MatrixForwardProjector> {
        let mut projector = MatrixForwardProjector::new(self.matrix()?);
        projector.set_up(self.proj_data_info()?, &Image::zeros(self.fov()))?;
        Ok(projector)
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config = fs::read_to_string(path)
        .map_err(|e| ProjError::Config(format!("couldn't read config file `{}`: {e}", path.display())))?;
    Config::from_toml_str(&config)
}
