/// Constants used by split validation and default ratios.
pub mod splits {
    use crate::splits::SplitLabel;

    /// Allowed absolute deviation of the fraction sum from `1.0`.
    pub const FRACTION_SUM_TOLERANCE: f64 = 1e-6;
    /// Default three-way fractions `(train, validation, test)`.
    pub const DEFAULT_TRAIN_VALID_TEST: (f64, f64, f64) = (0.8, 0.1, 0.1);
    /// Default two-way fractions `(train, validation)`.
    pub const DEFAULT_TRAIN_VALID: (f64, f64) = (0.9, 0.1);
    /// Order in which buckets are offered each scaffold group.
    pub const BUCKET_PRIORITY: [SplitLabel; 3] =
        [SplitLabel::Validation, SplitLabel::Test, SplitLabel::Train];
    /// Canonical split iteration order used for reporting.
    pub const ALL_SPLITS: [SplitLabel; 3] =
        [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
}

/// Constants used by the deterministic permutation source.
pub mod rng {
    /// Golden-ratio increment of the splitmix64 state.
    pub const SPLITMIX_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    /// First splitmix64 output multiplier.
    pub const SPLITMIX_MUL_1: u64 = 0xBF58_476D_1CE4_E5B9;
    /// Second splitmix64 output multiplier.
    pub const SPLITMIX_MUL_2: u64 = 0x94D0_49BB_1331_11EB;
}

/// Constants used by the SMILES reader and writer.
pub mod smiles {
    /// Element symbols indexed by atomic number; index 0 is the `*` wildcard.
    pub const ELEMENT_SYMBOLS: [&str; 119] = [
        "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P",
        "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
        "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh",
        "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
        "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re",
        "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
        "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db",
        "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
    ];
    /// Atomic numbers that may be written without brackets.
    pub const ORGANIC_SUBSET: [u8; 10] = [5, 6, 7, 8, 9, 15, 16, 17, 35, 53];
    /// Atomic numbers that may carry a lowercase aromatic symbol.
    pub const AROMATIC_ELEMENTS: [u8; 9] = [5, 6, 7, 8, 15, 16, 33, 34, 52];
    /// Highest ring-closure number representable with `%nn`.
    pub const MAX_RING_DIGIT: u16 = 99;

    /// Normal valences used to derive implicit hydrogens.
    pub fn normal_valences(atomic_number: u8) -> &'static [u8] {
        match atomic_number {
            5 => &[3],
            6 => &[4],
            7 | 33 => &[3, 5],
            8 => &[2],
            15 => &[3, 5],
            16 | 34 | 52 => &[2, 4, 6],
            9 | 17 | 35 | 53 => &[1],
            _ => &[],
        }
    }
}
