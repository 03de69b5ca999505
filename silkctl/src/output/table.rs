use tabled::{Table, settings::Style};

/// The table style used for all terminal output
pub(crate) trait SilkctlTable {
    fn styled(&mut self) -> &mut Self;
}

impl SilkctlTable for Table {
    fn styled(&mut self) -> &mut Self {
        self.with(Style::psql())
    }
}
