/// Millimetres per PDF point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Page size and margin in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 15.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y (from the top edge) content may reach.
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4
    }
}

pub const DEFAULT_TITLE: &str = "Was bin ich?";
pub const DEFAULT_FOOTER: &str = "Powered by Heimatverein Vorchdorf - Was bin ich?";

#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub page: PageGeometry,
    /// TrueType family to embed instead of the built-in Helvetica.
    pub font_family: Option<String>,
    pub title: String,
    pub footer: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            page: PageGeometry::A4,
            font_family: None,
            title: DEFAULT_TITLE.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl ReportOptions {
    /// Defaults plus `ARTIFACT_REPORT_FONT` (font family) when set.
    pub fn from_env() -> Self {
        let font_family = std::env::var("ARTIFACT_REPORT_FONT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        ReportOptions {
            font_family,
            ..ReportOptions::default()
        }
    }
}
