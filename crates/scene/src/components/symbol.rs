/// How a graphic is drawn by the host. Styling details are the host's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Polygon,
    SelectedPolygon,
    Line,
    Label(String),
}

impl Symbol {
    pub fn is_selected(&self) -> bool {
        matches!(self, Symbol::SelectedPolygon)
    }
}
