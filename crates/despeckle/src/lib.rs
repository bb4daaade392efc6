#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use despeckle_image as image;

#[doc(inline)]
pub use despeckle_imgproc as imgproc;

#[doc(inline)]
pub use despeckle_io as io;

#[doc(inline)]
pub use despeckle_dataset as dataset;
