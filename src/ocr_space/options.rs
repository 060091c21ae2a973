//! Per-request OCR options.

use clap::{Args, ValueEnum};

/// Languages supported by the OCR.space API.
///
/// The variant names are the service's own language codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Language {
    /// Auto-detect (engine 2 only).
    #[default]
    Auto,
    /// Arabic.
    Ara,
    /// Bulgarian.
    Bul,
    /// Chinese (Simplified).
    Chs,
    /// Chinese (Traditional).
    Cht,
    /// Croatian.
    Hrv,
    /// Czech.
    Cze,
    /// Danish.
    Dan,
    /// Dutch.
    Dut,
    /// English.
    Eng,
    /// Finnish.
    Fin,
    /// French.
    Fre,
    /// German.
    Ger,
    /// Greek.
    Gre,
    /// Hungarian.
    Hun,
    /// Italian.
    Ita,
    /// Japanese.
    Jpn,
    /// Korean.
    Kor,
    /// Polish.
    Pol,
    /// Portuguese.
    Por,
    /// Russian.
    Rus,
    /// Slovenian.
    Slv,
    /// Spanish.
    Spa,
    /// Swedish.
    Swe,
    /// Turkish.
    Tur,
}

impl Language {
    /// The code sent in the `language` form field.
    pub fn code(self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::Ara => "ara",
            Language::Bul => "bul",
            Language::Chs => "chs",
            Language::Cht => "cht",
            Language::Hrv => "hrv",
            Language::Cze => "cze",
            Language::Dan => "dan",
            Language::Dut => "dut",
            Language::Eng => "eng",
            Language::Fin => "fin",
            Language::Fre => "fre",
            Language::Ger => "ger",
            Language::Gre => "gre",
            Language::Hun => "hun",
            Language::Ita => "ita",
            Language::Jpn => "jpn",
            Language::Kor => "kor",
            Language::Pol => "pol",
            Language::Por => "por",
            Language::Rus => "rus",
            Language::Slv => "slv",
            Language::Spa => "spa",
            Language::Swe => "swe",
            Language::Tur => "tur",
        }
    }
}

/// OCR.space engines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OcrEngine {
    /// Engine 1, the original engine.
    #[clap(name = "1")]
    Engine1,

    /// Engine 2, better for certain image types.
    #[default]
    #[clap(name = "2")]
    Engine2,
}

impl OcrEngine {
    /// The value sent in the `OCREngine` form field.
    pub fn code(self) -> &'static str {
        match self {
            OcrEngine::Engine1 => "1",
            OcrEngine::Engine2 => "2",
        }
    }
}

/// Options for a single OCR request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OcrRequestOptions {
    pub language: Language,
    pub engine: OcrEngine,
    pub detect_orientation: bool,
    pub overlay_required: bool,
    pub scale: bool,
    pub table: bool,
}

/// Command-line node parameters.
#[derive(Args, Clone, Debug)]
pub struct NodeOpts {
    /// Name of the binary property containing the image to OCR.
    #[clap(long = "binary-property", default_value = "data")]
    pub binary_property_name: String,

    /// Language to use for OCR.
    #[clap(long, value_enum, default_value_t = Language::default())]
    pub language: Language,

    /// OCR engine to use for text extraction.
    #[clap(long, value_enum, default_value_t = OcrEngine::default())]
    pub engine: OcrEngine,

    /// Automatically detect and correct image orientation.
    #[clap(long)]
    pub detect_orientation: bool,

    /// Return word-level bounding box coordinates.
    #[clap(long = "overlay")]
    pub overlay_required: bool,

    /// Upscale the image for better OCR accuracy.
    #[clap(long)]
    pub scale: bool,

    /// Optimize for tables, receipts and other line-by-line documents.
    #[clap(long)]
    pub table: bool,
}

impl NodeOpts {
    /// The request options described by these parameters.
    pub fn request_options(&self) -> OcrRequestOptions {
        OcrRequestOptions {
            language: self.language,
            engine: self.engine,
            detect_orientation: self.detect_orientation,
            overlay_required: self.overlay_required,
            scale: self.scale,
            table: self.table,
        }
    }
}
