//! Terminal stylesheet.
//!
//! Every field starts unstyled; `colorize` fills them in when the terminal
//! supports color.

use owo_colors::Style;

#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub bold: Style,
    /// Section titles.
    pub header: Style,
    /// The master row of a topology.
    pub master: Style,
    /// Slave rows of a topology.
    pub slave: Style,
    /// IP addresses and DNS names.
    pub address: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.master = Style::new().bold().magenta();
        self.slave = Style::new().magenta();
        self.address = Style::new().underline();
    }
}
