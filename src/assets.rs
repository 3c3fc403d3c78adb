use std::path::PathBuf;

use log::error;

/// Number of images a level must provide to be playable.
pub const IMAGES_PER_LEVEL: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    /// Position in the correct order, starting at 0.
    pub index: usize,
    pub path: PathBuf,
}

impl ImageAsset {
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image {}", self.index + 1))
    }
}

/// Supplies the images for a level, in their correct order. Fewer than
/// [`IMAGES_PER_LEVEL`] images means the level cannot be played.
pub trait ImageProvider {
    fn images_for_level(&self, level: u32) -> Vec<ImageAsset>;
}

/// Looks up `level{N}_img{i}.png` files in a directory.
pub struct FsImageProvider {
    dir: PathBuf,
}

impl FsImageProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn image_path(&self, level: u32, index: usize) -> PathBuf {
        self.dir.join(format!("level{level}_img{}.png", index + 1))
    }
}

impl ImageProvider for FsImageProvider {
    fn images_for_level(&self, level: u32) -> Vec<ImageAsset> {
        let mut images = Vec::with_capacity(IMAGES_PER_LEVEL);
        for index in 0..IMAGES_PER_LEVEL {
            let path = self.image_path(level, index);
            if path.is_file() {
                images.push(ImageAsset { index, path });
            } else {
                error!("Failed to load image {path:?}: file not found");
            }
        }
        images
    }
}
