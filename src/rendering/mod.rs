pub mod font;
pub mod layout;
pub mod plot;
pub mod raster;
pub mod renderer;
pub mod sparkline;
pub mod svg;

pub use font::{load_font_from_path, TextMeasure};
pub use layout::{token_boxes, wrap_lines, TokenBox};
pub use plot::{Plot, PlotLine};
pub use raster::{to_data_uri, RasterRenderer};
pub use renderer::{PlotRenderer, RenderError};
pub use sparkline::{
    build_sparkline, build_sparkline_boxes, GapPolicy, Interpolation, Overflow, Point,
    PointAnchor, Scale, SparklineError, SparklineOptions, SparklinePath,
};
pub use svg::SvgRenderer;
