pub mod decode;
pub mod dimensions;
pub mod encode;
pub mod orientation;
pub mod params;
pub mod resize;

pub use decode::{decode_image, DecodedImage};
pub use dimensions::{
    calculate_crop_to_fill_region, calculate_fit_inside_dimensions, plan_resize, CropRegion,
    ResizePlan,
};
pub use encode::encode_image;
pub use orientation::Orientation;
pub use params::{FitMode, OutputFormat, TransformParams};
pub use resize::resize_image;
