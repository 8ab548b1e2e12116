use bitflags::bitflags;

bitflags! {
    /// Class and method access flags, with their dex values
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const SYNCHRONIZED = 0x20;
        const BRIDGE = 0x40;
        const VARARGS = 0x80;
        const NATIVE = 0x100;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const STRICT = 0x800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const CONSTRUCTOR = 0x10000;
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

impl AccessFlags {
    /// Smali keywords in declaration order, e.g. `public static final`
    pub fn keywords(&self) -> String {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase().replace('_', "-"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse smali keywords (`public final`) into flags
    pub fn from_keywords<'a, I>(keywords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keywords.into_iter().try_fold(AccessFlags::empty(), |flags, word| {
            let name = word.trim().to_ascii_uppercase().replace('-', "_");
            AccessFlags::from_name(&name).map(|flag| flags | flag)
        })
    }
}
