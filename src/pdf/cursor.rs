use crate::config::PageGeometry;

/// Slack for float error when a block ends exactly on the bottom margin.
const FIT_TOLERANCE: f32 = 1e-3;

/// Vertical write position on the active page, in millimetres from the top edge.
#[derive(Clone, Debug)]
pub struct LayoutCursor {
    page: PageGeometry,
    y: f32,
    page_index: usize,
}

impl LayoutCursor {
    pub fn new(page: PageGeometry) -> Self {
        LayoutCursor {
            page,
            y: page.margin,
            page_index: 0,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Zero-based index of the page being written.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn geometry(&self) -> PageGeometry {
        self.page
    }

    pub fn content_width(&self) -> f32 {
        self.page.content_width()
    }

    pub fn at_page_top(&self) -> bool {
        (self.y - self.page.margin).abs() < 0.01
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.page.bottom() + FIT_TOLERANCE
    }

    /// Ensure `height` fits below the cursor, starting a new page when it does not.
    /// Returns true when a page break was taken. A block taller than a whole page
    /// is written from the top of a fresh page; it cannot fit anywhere better.
    pub fn reserve(&mut self, height: f32) -> bool {
        if self.fits(height) {
            return false;
        }
        if self.at_page_top() {
            log::warn!(
                "block of {height:.1}mm exceeds page content height {:.1}mm",
                self.page.bottom() - self.page.margin
            );
            return false;
        }
        self.break_page();
        true
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    pub fn move_to(&mut self, y: f32) {
        self.y = y;
    }

    pub(crate) fn break_page(&mut self) {
        self.page_index += 1;
        self.y = self.page.margin;
    }
}
