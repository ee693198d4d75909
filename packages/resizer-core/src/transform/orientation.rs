use image::DynamicImage;

/// EXIF Orientation タグの値
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    Transpose = 5,
    Rotate90 = 6,
    Transverse = 7,
    Rotate270 = 8,
}

impl Orientation {
    /// u16 値から Orientation を作成
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// バイト列から EXIF Orientation タグを読み取る
    ///
    /// EXIF がない・壊れている場合は Normal として扱う
    pub fn from_exif(data: &[u8]) -> Self {
        let mut cursor = std::io::Cursor::new(data);
        exif::Reader::new()
            .read_from_container(&mut cursor)
            .ok()
            .and_then(|exif| {
                exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .and_then(|value| u16::try_from(value).ok())
            .and_then(Self::from_u16)
            .unwrap_or_default()
    }

    /// 画像を正立させる
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u16() {
        assert_eq!(Orientation::from_u16(1), Some(Orientation::Normal));
        assert_eq!(Orientation::from_u16(6), Some(Orientation::Rotate90));
        assert_eq!(Orientation::from_u16(8), Some(Orientation::Rotate270));
        assert_eq!(Orientation::from_u16(9), None);
    }

    #[test]
    fn test_from_exif_without_metadata() {
        assert_eq!(Orientation::from_exif(b"not an image"), Orientation::Normal);
    }

    #[test]
    fn test_apply_rotate90_swaps_dimensions() {
        let img = DynamicImage::new_rgb8(10, 20);

        let result = Orientation::Rotate90.apply(img);
        assert_eq!((result.width(), result.height()), (20, 10));
    }

    #[test]
    fn test_apply_flip_keeps_dimensions() {
        let img = DynamicImage::new_rgb8(10, 20);

        let result = Orientation::FlipHorizontal.apply(img);
        assert_eq!((result.width(), result.height()), (10, 20));
    }
}
