//! # 字体解析与字形光栅化
//!
//! ## 设计思路
//!
//! 合成器只依赖 `TextFace` 抽象：给出字号与文本，返回前进宽度与覆盖率遮罩。
//! 两种实现：
//! - `OutlineFace`：基于 rusttype 的 TrueType/OpenType 字体，按家族名在字体目录中查找。
//! - `BitmapFace`：基于 font8x8 的内置点阵字体，找不到字体文件时兜底，保证任何环境都能出图。
//!
//! ## 实现思路
//!
//! - 字体目录只扫描一次，建立“小写文件名 → 路径”索引。
//! - 已解析的字体文件在进程内全局缓存，多次渲染不重复读盘。
//! - 每个 `FontLibrary` 另外缓存 (家族, 字重) → 字形实现 的解析结果。

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use font8x8::{BASIC_FONTS, UnicodeFonts};
use once_cell::sync::{Lazy, OnceCell};
use rusttype::{Font, Scale, point};

use super::MemeError;
use super::model::FontFamily;
use super::raster::CoverageMask;

/// 扫描字体目录时的最大递归深度。
const MAX_SCAN_DEPTH: usize = 4;

static FONT_FILE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Font<'static>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// 字重。主文字使用粗体，水印使用常规字重。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// 可光栅化的字体。
pub trait TextFace: Send + Sync {
    /// 用于日志与 `fonts` 命令展示的名称。
    fn name(&self) -> &str;

    /// 文本在指定字号下的前进宽度（像素）。
    fn advance_width(&self, text: &str, px: f32) -> f32;

    /// 光栅化整段文本；遮罩记录笔位起点与基线位置。
    fn rasterize(&self, text: &str, px: f32) -> CoverageMask;
}

/// TrueType/OpenType 字体。
pub struct OutlineFace {
    name: String,
    font: Arc<Font<'static>>,
}

impl OutlineFace {
    /// 从字体文件加载，结果在进程内缓存。
    pub fn load(path: &Path) -> Result<Self, MemeError> {
        let font = load_font_cached(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, font })
    }
}

impl TextFace for OutlineFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_width(&self, text: &str, px: f32) -> f32 {
        let scale = Scale::uniform(px);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn rasterize(&self, text: &str, px: f32) -> CoverageMask {
        let scale = Scale::uniform(px);
        let glyphs: Vec<_> = self.font.layout(text, scale, point(0.0, 0.0)).collect();

        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                bounds = Some(match bounds {
                    None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                    Some((x0, y0, x1, y1)) => (
                        x0.min(bb.min.x),
                        y0.min(bb.min.y),
                        x1.max(bb.max.x),
                        y1.max(bb.max.y),
                    ),
                });
            }
        }

        let Some((min_x, min_y, max_x, max_y)) = bounds else {
            return CoverageMask::empty();
        };

        let mut mask = CoverageMask::new(
            (max_x - min_x) as u32,
            (max_y - min_y) as u32,
            -min_x,
            -min_y,
        );

        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let x = bb.min.x - min_x + gx as i32;
                    let y = bb.min.y - min_y + gy as i32;
                    if x >= 0 && y >= 0 {
                        mask.accumulate(x as u32, y as u32, v);
                    }
                });
            }
        }

        mask
    }
}

/// 已提示过的缺字，每个字符只告警一次。
static REPORTED_MISSING_GLYPHS: Lazy<Mutex<HashSet<char>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// 内置 8x8 点阵字体，按整数倍最近邻放大。
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapFace;

impl BitmapFace {
    /// 每个点阵像素放大的倍数。
    fn cell_scale(px: f32) -> u32 {
        ((px / 8.0).round() as u32).max(1)
    }

    /// 点阵字库中没有、会被画成 `?` 的字符（去重，按出现顺序）。
    pub fn unsupported_chars(text: &str) -> Vec<char> {
        let mut seen = HashSet::new();
        text.chars()
            .filter(|ch| BASIC_FONTS.get(*ch).is_none() && seen.insert(*ch))
            .collect()
    }

    /// 返回此前未告警过的缺字，并记为已告警。
    fn newly_missing(text: &str) -> Vec<char> {
        let missing = Self::unsupported_chars(text);
        if missing.is_empty() {
            return missing;
        }
        match REPORTED_MISSING_GLYPHS.lock() {
            Ok(mut reported) => missing.into_iter().filter(|ch| reported.insert(*ch)).collect(),
            Err(_) => missing,
        }
    }

    fn glyph(ch: char) -> [u8; 8] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0u8; 8])
    }
}

impl TextFace for BitmapFace {
    fn name(&self) -> &str {
        "builtin-8x8"
    }

    fn advance_width(&self, text: &str, px: f32) -> f32 {
        (text.chars().count() as u32 * 8 * Self::cell_scale(px)) as f32
    }

    fn rasterize(&self, text: &str, px: f32) -> CoverageMask {
        let count = text.chars().count() as u32;
        if count == 0 {
            return CoverageMask::empty();
        }

        let missing = Self::newly_missing(text);
        if !missing.is_empty() {
            let listed: String = missing.iter().collect();
            log::warn!("⚠️ 内置点阵字体缺少字符 \"{}\"，已替换为 ?", listed);
        }

        let k = Self::cell_scale(px);
        let cell = 8 * k;
        // 第 8 行留给下伸部分，基线在第 7 行之下
        let mut mask = CoverageMask::new(count * cell, cell, 0, (7 * k) as i32);

        for (index, ch) in text.chars().enumerate() {
            let base_x = index as u32 * cell;
            for (row, bits) in Self::glyph(ch).iter().enumerate() {
                for col in 0..8u32 {
                    if (bits >> col) & 1 == 0 {
                        continue;
                    }
                    for dy in 0..k {
                        for dx in 0..k {
                            mask.accumulate(base_x + col * k + dx, row as u32 * k + dy, 1.0);
                        }
                    }
                }
            }
        }

        mask
    }
}

/// 字体库：按家族与字重解析出可用的 `TextFace`。
pub struct FontLibrary {
    dirs: Vec<PathBuf>,
    index: OnceCell<HashMap<String, PathBuf>>,
    faces: Mutex<HashMap<(FontFamily, FontWeight), Arc<dyn TextFace>>>,
}

impl FontLibrary {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            index: OnceCell::new(),
            faces: Mutex::new(HashMap::new()),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// 各家族/字重按优先级排列的候选文件名（小写）。
    fn candidates(family: FontFamily, weight: FontWeight) -> &'static [&'static str] {
        match (family, weight) {
            (FontFamily::Impact, _) => &["impact.ttf"],
            (FontFamily::ComicSansMs, FontWeight::Bold) => &[
                "comicbd.ttf",
                "comic sans ms bold.ttf",
                "comic.ttf",
                "comic sans ms.ttf",
            ],
            (FontFamily::ComicSansMs, FontWeight::Regular) => {
                &["comic.ttf", "comic sans ms.ttf", "comicbd.ttf"]
            }
            (FontFamily::ArialBlack, _) => &["ariblk.ttf", "arial black.ttf", "arial_black.ttf"],
        }
    }

    /// 查找家族对应的字体文件，找不到返回 `None`。
    pub fn locate(&self, family: FontFamily, weight: FontWeight) -> Option<PathBuf> {
        let index = self.index.get_or_init(|| build_index(&self.dirs));
        Self::candidates(family, weight)
            .iter()
            .find_map(|name| index.get(*name).cloned())
    }

    /// 解析可用字体；字体文件缺失或损坏时回退内置点阵字体。
    pub fn face(&self, family: FontFamily, weight: FontWeight) -> Result<Arc<dyn TextFace>, MemeError> {
        let mut faces = self
            .faces
            .lock()
            .map_err(|_| MemeError::ResourceLimit("字体缓存锁已中毒".to_string()))?;

        if let Some(face) = faces.get(&(family, weight)) {
            return Ok(Arc::clone(face));
        }

        let face: Arc<dyn TextFace> = match self.locate(family, weight) {
            Some(path) => match OutlineFace::load(&path) {
                Ok(face) => {
                    log::info!("🔤 字体已加载 - {} ({:?}) -> {}", family, weight, path.display());
                    Arc::new(face)
                }
                Err(err) => {
                    log::warn!("⚠️ 字体文件不可用，回退内置点阵字体：{}", err);
                    Arc::new(BitmapFace)
                }
            },
            None => {
                log::warn!("⚠️ 未找到字体 {} ({:?})，使用内置点阵字体", family, weight);
                Arc::new(BitmapFace)
            }
        };

        faces.insert((family, weight), Arc::clone(&face));
        Ok(face)
    }
}

fn build_index(dirs: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for dir in dirs {
        scan_dir(dir, 0, &mut index);
    }
    log::debug!("字体目录扫描完成 - {} 个文件", index.len());
    index
}

fn scan_dir(dir: &Path, depth: usize, index: &mut HashMap<String, PathBuf>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, depth + 1, index);
        } else if let Some(name) = path.file_name() {
            // 先出现的目录优先
            index
                .entry(name.to_string_lossy().to_lowercase())
                .or_insert(path);
        }
    }
}

fn load_font_cached(path: &Path) -> Result<Arc<Font<'static>>, MemeError> {
    let mut cache = FONT_FILE_CACHE
        .lock()
        .map_err(|_| MemeError::ResourceLimit("字体文件缓存锁已中毒".to_string()))?;

    if let Some(font) = cache.get(path) {
        return Ok(Arc::clone(font));
    }

    let bytes = fs::read(path)
        .map_err(|e| MemeError::Font(format!("无法读取字体文件 {}：{}", path.display(), e)))?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| MemeError::Font(format!("无法解析字体文件：{}", path.display())))?;

    let font = Arc::new(font);
    cache.insert(path.to_path_buf(), Arc::clone(&font));
    Ok(font)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("meme-font-test-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn bitmap_face_metrics_scale_with_size() {
        let face = BitmapFace;
        assert_eq!(face.advance_width("abc", 8.0), 24.0);
        assert_eq!(face.advance_width("abc", 16.0), 48.0);
        assert_eq!(face.advance_width("", 33.0), 0.0);

        let mask = face.rasterize("A", 16.0);
        assert_eq!((mask.width(), mask.height()), (16, 16));
        assert_eq!(mask.baseline_y(), 14);
        assert!(!mask.is_blank());
    }

    #[test]
    fn bitmap_face_substitutes_missing_glyphs() {
        assert_eq!(BitmapFace::unsupported_chars("OK é✓é"), vec!['é', '✓']);
        assert!(BitmapFace::unsupported_chars("PLAIN ascii!").is_empty());
        assert_eq!(BitmapFace.rasterize("☃", 16.0), BitmapFace.rasterize("?", 16.0));
    }

    #[test]
    fn missing_glyphs_are_reported_once() {
        assert_eq!(BitmapFace::newly_missing("☂ and ☂"), vec!['☂']);
        assert!(BitmapFace::newly_missing("☂").is_empty());
    }

    #[test]
    fn bitmap_face_space_is_blank() {
        let mask = BitmapFace.rasterize("  ", 14.0);
        assert_eq!(mask.width(), 32);
        assert!(mask.is_blank());
    }

    #[test]
    fn empty_library_falls_back_to_bitmap() {
        let library = FontLibrary::new(Vec::new());
        assert!(library.locate(FontFamily::Impact, FontWeight::Bold).is_none());

        let face = library
            .face(FontFamily::Impact, FontWeight::Bold)
            .expect("fallback face");
        assert_eq!(face.name(), "builtin-8x8");
    }

    #[test]
    fn locate_matches_file_names_case_insensitively() {
        let dir = temp_dir("locate");
        let nested = dir.join("truetype").join("msttcorefonts");
        fs::create_dir_all(&nested).expect("create nested dir");
        fs::write(nested.join("Impact.ttf"), b"not a real font").expect("write font stub");
        fs::write(nested.join("comic.ttf"), b"not a real font").expect("write font stub");

        let library = FontLibrary::new(vec![dir.clone()]);
        assert_eq!(
            library.locate(FontFamily::Impact, FontWeight::Bold),
            Some(nested.join("Impact.ttf"))
        );
        // 没有 comicbd.ttf 时粗体退到常规文件
        assert_eq!(
            library.locate(FontFamily::ComicSansMs, FontWeight::Bold),
            Some(nested.join("comic.ttf"))
        );
        assert!(library.locate(FontFamily::ArialBlack, FontWeight::Bold).is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unparseable_font_file_falls_back_to_bitmap() {
        let dir = temp_dir("corrupt");
        fs::write(dir.join("ariblk.ttf"), b"garbage").expect("write font stub");

        let library = FontLibrary::new(vec![dir.clone()]);
        let face = library
            .face(FontFamily::ArialBlack, FontWeight::Regular)
            .expect("fallback face");
        assert_eq!(face.name(), "builtin-8x8");

        let _ = fs::remove_dir_all(&dir);
    }
}
