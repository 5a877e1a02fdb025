//! 纹理数据
//!
//! 使用 `image` crate 解码（DDS/PNG/...），统一转换为 RGBA8。
//! 资源缺失时生成棋盘格纹理代替，示例在没有素材包的情况下也能运行。

use std::path::{Path, PathBuf};

use crate::core::error::{Result, TextureError};
use crate::{engine_info, engine_warn};

/// 闪电动画的帧数
pub const BOLT_FRAME_COUNT: usize = 60;

/// 棋盘格备用纹理的边长（像素）
const FALLBACK_SIZE: u32 = 64;

/// 棋盘格每格的像素数
const FALLBACK_CELL: u32 = 8;

/// CPU 侧的 RGBA8 纹理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// 纹理名称（通常是文件名）
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// 紧密排列的 RGBA8 像素，行距为 `width * 4`
    pub rgba8: Vec<u8>,
}

impl TextureData {
    /// 从文件解码
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TextureError::FileNotFound(path.to_path_buf()).into());
        }

        let bytes = std::fs::read(path)?;
        let texture = Self::from_bytes(texture_name(path), &bytes).map_err(|reason| {
            TextureError::Decode {
                path: path.to_path_buf(),
                reason,
            }
        })?;

        engine_info!(
            path = %path.display(),
            width = texture.width,
            height = texture.height,
            "Texture loaded"
        );
        Ok(texture)
    }

    /// 从内存中的图像文件解码
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> std::result::Result<Self, String> {
        let image = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let rgba = image.to_rgba8();

        Ok(Self {
            name: name.into(),
            width: rgba.width(),
            height: rgba.height(),
            rgba8: rgba.into_raw(),
        })
    }

    /// 加载失败时用棋盘格代替
    pub fn load_or_fallback(path: &Path) -> Self {
        match Self::load(path) {
            Ok(texture) => texture,
            Err(err) => {
                engine_warn!(
                    path = %path.display(),
                    error = %err,
                    "Texture unavailable, using checkerboard"
                );
                Self::checkerboard(
                    texture_name(path),
                    FALLBACK_SIZE,
                    [255, 0, 255, 255],
                    [32, 32, 32, 255],
                )
            }
        }
    }

    /// 生成棋盘格纹理
    pub fn checkerboard(name: impl Into<String>, size: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let mut rgba8 = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let even = ((x / FALLBACK_CELL) + (y / FALLBACK_CELL)) % 2 == 0;
                rgba8.extend_from_slice(if even { &a } else { &b });
            }
        }

        Self {
            name: name.into(),
            width: size,
            height: size,
            rgba8,
        }
    }

    /// 每行字节数
    pub fn row_pitch(&self) -> usize {
        self.width as usize * 4
    }

    /// 像素数据是否与尺寸一致
    pub fn is_consistent(&self) -> bool {
        self.width > 0 && self.height > 0 && self.rgba8.len() == self.row_pitch() * self.height as usize
    }
}

/// 闪电动画帧的路径：`BoltAnim/Bolt001.dds` .. `Bolt060.dds`
pub fn bolt_frame_paths(asset_dir: &Path) -> Vec<PathBuf> {
    (1..=BOLT_FRAME_COUNT)
        .map(|i| asset_dir.join("BoltAnim").join(format!("Bolt{:03}.dds", i)))
        .collect()
}

fn texture_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DemoError;

    #[test]
    fn test_checkerboard() {
        let tex = TextureData::checkerboard("fallback", 16, [255; 4], [0, 0, 0, 255]);
        assert!(tex.is_consistent());
        assert_eq!(tex.row_pitch(), 64);
        // (0,0) 和 (8,0) 分别在两种颜色的格子里
        assert_eq!(&tex.rgba8[0..4], &[255; 4]);
        assert_eq!(&tex.rgba8[32..36], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = TextureData::load(Path::new("does/not/exist/grass.dds")).unwrap_err();
        assert!(matches!(err, DemoError::Texture(TextureError::FileNotFound(_))));
    }

    #[test]
    fn test_fallback_keeps_name() {
        let tex = TextureData::load_or_fallback(Path::new("does/not/exist/water1.dds"));
        assert_eq!(tex.name, "water1");
        assert_eq!(tex.width, FALLBACK_SIZE);
        assert!(tex.is_consistent());
    }

    #[test]
    fn test_decode_png_from_memory() {
        use image::codecs::png::PngEncoder;
        use image::{ColorType, ImageEncoder, RgbaImage};

        let mut img = RgbaImage::new(4, 2);
        for p in img.pixels_mut() {
            *p = image::Rgba([10, 20, 30, 40]);
        }

        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&img, img.width(), img.height(), ColorType::Rgba8.into())
            .unwrap();

        let tex = TextureData::from_bytes("png", &bytes).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(&tex.rgba8[0..4], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(TextureData::from_bytes("junk", b"not an image").is_err());
    }

    #[test]
    fn test_bolt_frame_paths() {
        let paths = bolt_frame_paths(Path::new("textures"));
        assert_eq!(paths.len(), BOLT_FRAME_COUNT);
        assert_eq!(paths[0], Path::new("textures/BoltAnim/Bolt001.dds"));
        assert_eq!(paths[59], Path::new("textures/BoltAnim/Bolt060.dds"));
    }
}
