use foundation::handles::Handle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphicId(pub Handle);

impl GraphicId {
    pub fn raw(&self) -> u64 {
        self.0.raw()
    }
}

impl std::fmt::Display for GraphicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "graphic#{}", self.0.raw())
    }
}
