//! Image asset resolution.
//!
//! Problem images are referenced by filename and resolved against one
//! asset directory. A missing image never stops a session; it is reported
//! in the preload record and by `study check`.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Resolution status of one image reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssetStatus {
    pub image: String,
    pub path: PathBuf,
    pub found: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute references are used as-is.
    #[must_use]
    pub fn resolve(&self, image: &str) -> PathBuf {
        let reference = Path::new(image);
        if reference.is_absolute() {
            reference.to_owned()
        } else {
            self.root.join(reference)
        }
    }

    #[must_use]
    pub fn status(&self, image: &str) -> AssetStatus {
        let path = self.resolve(image);
        AssetStatus {
            image: image.to_owned(),
            found: path.is_file(),
            path,
        }
    }

    /// Status of every image, in the given order.
    pub fn check<'a, I>(&self, images: I) -> Vec<AssetStatus>
    where
        I: IntoIterator<Item = &'a str>,
    {
        images.into_iter().map(|img| self.status(img)).collect()
    }

    /// Images that do not resolve to a file.
    pub fn missing<'a, I>(&self, images: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.check(images)
            .into_iter()
            .filter(|s| !s.found)
            .map(|s| {
                tracing::warn!(image = %s.image, path = %s.path.display(), "image asset missing");
                s.image
            })
            .collect()
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(".")
    }
}
