//! Known organization and classification codes of the extract service.

/// A code the upstream service accepts, with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub code: u32,
    pub name: &'static str,
}

const fn entry(code: u32, name: &'static str) -> CatalogEntry {
    CatalogEntry { code, name }
}

pub const ORGANIZATIONS: &[CatalogEntry] = &[
    entry(1, "Neuquén"),
    entry(2, "La Rioja"),
    entry(3, "La Pampa"),
    entry(4, "Corrientes"),
    entry(5, "Río Negro"),
    entry(6, "Salta"),
    entry(7, "Santiago del Estero"),
    entry(10, "Jujuy"),
    entry(12, "Tierra del Fuego"),
    entry(14, "Catamarca"),
];

pub const CLASSIFICATIONS: &[CatalogEntry] = &[
    entry(0, "Quiniela / Tómbola"),
    entry(3, "Loto"),
    entry(4, "Quini 6"),
    entry(6, "Pozo Quiniela"),
    entry(7, "Brinco"),
    entry(9, "Loto 5"),
    entry(10, "Lotería"),
    entry(21, "Patagonia Telebingo"),
    entry(25, "Telekino Automatizado"),
];

const UNKNOWN: &str = "Desconocida";

pub fn organization_name(code: u32) -> &'static str {
    lookup(ORGANIZATIONS, code)
}

pub fn classification_name(code: u32) -> &'static str {
    lookup(CLASSIFICATIONS, code)
}

fn lookup(entries: &[CatalogEntry], code: u32) -> &'static str {
    entries
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.name)
        .unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(organization_name(1), "Neuquén");
        assert_eq!(organization_name(14), "Catamarca");
        assert_eq!(classification_name(0), "Quiniela / Tómbola");
        assert_eq!(classification_name(25), "Telekino Automatizado");
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(organization_name(99), "Desconocida");
        assert_eq!(classification_name(1), "Desconocida");
    }
}
