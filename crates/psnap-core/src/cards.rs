//! ---
//! psnap_section: "04-acquisition-engine"
//! psnap_subsection: "module"
//! psnap_type: "source"
//! psnap_scope: "code"
//! psnap_description: "Known backplane option cards and how their parameters are reached."
//! psnap_version: "v0.0.0-prealpha"
//! psnap_owner: "tbd"
//! ---
use psnap_transport::cip::class;

use crate::catalog::{powerflex755, CatalogEntry};

/// How the parameters of a known card are reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardAccess {
    /// The card has no standard parameter object.
    Skip,
    /// Parameters live under `class_id`. An empty list means the card is
    /// enumerated with Online Read Full under that class.
    Parameters {
        class_id: u16,
        use_scattered: bool,
        parameters: &'static [CatalogEntry],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardDefinition {
    pub product_code: u16,
    pub label: &'static str,
    pub access: CardAccess,
}

/// PowerFlex 750-series option cards (illustrative product codes).
pub static POWERFLEX_750_CARDS: &[CardDefinition] = &[
    CardDefinition {
        product_code: 0x0A11,
        label: "20-750-ENETR",
        access: CardAccess::Parameters {
            class_id: class::HOST_DPI_PARAMETER,
            use_scattered: false,
            parameters: powerflex755::ENETR,
        },
    },
    CardDefinition {
        product_code: 0x0A21,
        label: "20-750-2262C-2R",
        access: CardAccess::Parameters {
            class_id: class::HOST_DPI_PARAMETER,
            use_scattered: true,
            parameters: powerflex755::IO_2262C,
        },
    },
    CardDefinition {
        product_code: 0x0A31,
        label: "20-750-DNET",
        access: CardAccess::Parameters {
            class_id: class::HOST_DPI_PARAMETER,
            use_scattered: false,
            parameters: &[],
        },
    },
    CardDefinition {
        product_code: 0x0A41,
        label: "20-750-DLOGIX",
        access: CardAccess::Parameters {
            class_id: class::DEVICELOGIX_PARAMETER,
            use_scattered: false,
            parameters: &[],
        },
    },
    CardDefinition {
        product_code: 0x0A51,
        label: "20-750-S1 Safe Speed Monitor",
        access: CardAccess::Skip,
    },
];

pub fn lookup(cards: &'static [CardDefinition], product_code: u16) -> Option<&'static CardDefinition> {
    cards.iter().find(|card| card.product_code == product_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_product_code() {
        let card = lookup(POWERFLEX_750_CARDS, 0x0A21).unwrap();
        assert_eq!(card.label, "20-750-2262C-2R");
        assert!(lookup(POWERFLEX_750_CARDS, 0x7777).is_none());
    }

    #[test]
    fn product_codes_are_unique() {
        for (index, card) in POWERFLEX_750_CARDS.iter().enumerate() {
            assert!(POWERFLEX_750_CARDS[index + 1..]
                .iter()
                .all(|other| other.product_code != card.product_code));
        }
    }
}
