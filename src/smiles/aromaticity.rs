//! Hückel aromaticity perception for Kekulé input.
//!
//! Ring atoms that can contribute to a π system are grouped into fused
//! systems; a system whose π electron count is `4n + 2` is marked aromatic
//! as a whole. Atoms already written in lowercase are left alone.

use super::{BondOrder, Molecule};

const NITROGEN: u8 = 7;
const OXYGEN: u8 = 8;
const PHOSPHORUS: u8 = 15;
const SULFUR: u8 = 16;
const SELENIUM: u8 = 34;
const CARBON: u8 = 6;

pub(crate) fn perceive_aromaticity(mol: &mut Molecule) {
    let mut electrons: Vec<Option<u8>> = (0..mol.atom_count())
        .map(|atom| pi_electrons(mol, atom))
        .collect();
    prune_candidates(mol, &mut electrons);

    let mut seen = vec![false; mol.atom_count()];
    for start in 0..mol.atom_count() {
        if seen[start] || electrons[start].is_none() {
            continue;
        }
        let system = ring_system(mol, &electrons, start, &mut seen);
        let total: u32 = system
            .iter()
            .filter_map(|&atom| electrons[atom])
            .map(u32::from)
            .sum();
        if total >= 2 && (total - 2) % 4 == 0 {
            mark_aromatic(mol, &electrons, &system);
        }
    }
}

/// π electrons `atom` would donate to a ring system, or `None` when it cannot take part.
fn pi_electrons(mol: &Molecule, atom: usize) -> Option<u8> {
    let current = mol.atom(atom);
    if current.aromatic || !mol.is_ring_atom(atom) {
        return None;
    }

    let mut ring_doubles = 0;
    let mut exocyclic_double = None;
    for (neighbor, bond) in mol.neighbors(atom) {
        let bond = mol.bond(bond);
        match (bond.order, bond.in_ring) {
            (BondOrder::Triple | BondOrder::Quadruple | BondOrder::Aromatic, _) => return None,
            (BondOrder::Double, true) => ring_doubles += 1,
            (BondOrder::Double, false) => exocyclic_double = Some(neighbor),
            (BondOrder::Single, _) => {}
        }
    }

    match (ring_doubles, exocyclic_double) {
        (1, None) => Some(1),
        (0, Some(partner)) => {
            let partner = mol.atom(partner).atomic_number;
            let polar = matches!(partner, NITROGEN | OXYGEN | SULFUR);
            (current.atomic_number == CARBON && polar).then_some(0)
        }
        (0, None) => {
            let valence = mol.bond_valence(atom) + u32::from(current.hydrogens);
            match (current.atomic_number, current.charge) {
                (NITROGEN | PHOSPHORUS, 0) if valence == 3 => Some(2),
                (OXYGEN | SULFUR | SELENIUM, 0) if valence == 2 => Some(2),
                (CARBON, -1) => Some(2),
                (CARBON, 1) => Some(0),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Drop candidates that cannot sit on a conjugated cycle, until nothing changes.
fn prune_candidates(mol: &Molecule, electrons: &mut [Option<u8>]) {
    loop {
        let mut changed = false;
        for atom in 0..mol.atom_count() {
            if electrons[atom].is_none() {
                continue;
            }
            let mut ring_partners = 0;
            let mut orphaned_double = false;
            for (neighbor, bond) in mol.neighbors(atom) {
                let bond = mol.bond(bond);
                if !bond.in_ring {
                    continue;
                }
                let candidate = electrons[neighbor].is_some();
                if candidate {
                    ring_partners += 1;
                }
                if bond.order == BondOrder::Double && !candidate {
                    orphaned_double = true;
                }
            }
            if ring_partners < 2 || orphaned_double {
                electrons[atom] = None;
                changed = true;
            }
        }
        if !changed {
            return;
        }
    }
}

/// Candidate atoms reachable from `start` over ring bonds.
fn ring_system(
    mol: &Molecule,
    electrons: &[Option<u8>],
    start: usize,
    seen: &mut [bool],
) -> Vec<usize> {
    let mut system = Vec::new();
    let mut stack = vec![start];
    seen[start] = true;
    while let Some(atom) = stack.pop() {
        system.push(atom);
        for (neighbor, bond) in mol.neighbors(atom) {
            if seen[neighbor] || electrons[neighbor].is_none() || !mol.bond(bond).in_ring {
                continue;
            }
            seen[neighbor] = true;
            stack.push(neighbor);
        }
    }
    system
}

fn mark_aromatic(mol: &mut Molecule, electrons: &[Option<u8>], system: &[usize]) {
    for &atom in system {
        mol.atom_mut(atom).aromatic = true;
    }
    let conjugated: Vec<usize> = mol
        .bonds()
        .enumerate()
        .filter(|(_, (begin, end, bond))| {
            bond.in_ring
                && system.contains(begin)
                && electrons[*begin].is_some()
                && electrons[*end].is_some()
        })
        .map(|(idx, _)| idx)
        .collect();
    for bond in conjugated {
        mol.bond_mut(bond).order = BondOrder::Aromatic;
    }
}

#[cfg(test)]
mod tests {
    use crate::smiles::{BondOrder, parse_smiles};

    fn aromatic_atoms(smiles: &str) -> Vec<bool> {
        parse_smiles(smiles)
            .unwrap()
            .atoms()
            .map(|a| a.aromatic)
            .collect()
    }

    #[test]
    fn kekule_benzene_becomes_aromatic() {
        let mol = parse_smiles("C1=CC=CC=C1").unwrap();
        assert!(mol.atoms().all(|a| a.aromatic && a.hydrogens == 1));
        assert!(mol.bonds().all(|(_, _, b)| b.order == BondOrder::Aromatic));
    }

    #[test]
    fn heteroaromatic_rings_are_detected() {
        assert!(aromatic_atoms("C1=CC=NC=C1").iter().all(|&a| a));
        assert!(aromatic_atoms("C1=CNC=C1").iter().all(|&a| a));
        assert!(aromatic_atoms("C1=COC=C1").iter().all(|&a| a));
        assert!(aromatic_atoms("O=C1C=CC=CN1").iter().skip(1).all(|&a| a));
    }

    #[test]
    fn fused_systems_are_perceived_together() {
        assert!(aromatic_atoms("C1=CC=C2C=CC=CC2=C1").iter().all(|&a| a));
        assert!(aromatic_atoms("C1=CC=C2C(=C1)C=CN2").iter().all(|&a| a));
    }

    #[test]
    fn non_huckel_rings_stay_aliphatic() {
        assert!(aromatic_atoms("C1=CCC=C1").iter().all(|&a| !a));
        assert!(aromatic_atoms("C1=CC=CC=CC=C1").iter().all(|&a| !a));
        assert!(aromatic_atoms("C1CCCCC1").iter().all(|&a| !a));
        assert!(aromatic_atoms("C1=CCCCC1").iter().all(|&a| !a));
    }

    #[test]
    fn exocyclic_substituent_bond_stays_single() {
        let mol = parse_smiles("CC1=CC=CC=C1").unwrap();
        assert!(!mol.atom(0).aromatic);
        assert_eq!(mol.bond_between(0, 1).map(|b| b.order), Some(BondOrder::Single));
    }
}
