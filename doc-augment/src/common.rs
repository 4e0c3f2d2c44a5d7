pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use doc_region::{prelude::*, RatioRegion, TLBR};
pub use futures::stream::{self, StreamExt as _, TryStreamExt as _};
pub use image::{
    imageops::{self, FilterType},
    ColorType, DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage,
};
pub use itertools::Itertools as _;
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use par_stream::prelude::*;
pub use rand::prelude::*;
pub use rand_distr::{Normal, Poisson};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
pub use strum::{AsRefStr, EnumString, IntoStaticStr};
