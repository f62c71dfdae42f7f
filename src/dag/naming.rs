//! Opening name and ECO propagation along DAG edges
//!
//! A position in the book takes the book's name. Otherwise the name comes from
//! the parent: repertoire moves out of book get exactly one move suffix,
//! opponent moves keep the parent's name, and once a suffix has been added
//! descendants inherit it unchanged.

use super::node::{DagNode, Provenance};
use crate::chess::Color;
use crate::openings::Opening;

/// `"<N>."` before a white move, `"<N>.."` before a black move
pub fn move_number_prefix(move_num: u32, turn: Color) -> String {
    match turn {
        Color::White => format!("{}.", move_num),
        Color::Black => format!("{}..", move_num),
    }
}

/// Name and provenance for the position reached from `parent` by `mv`
pub fn opening_name(
    book: Option<&Opening>,
    parent: &DagNode,
    mv: &str,
    repertoire_color: Color,
) -> (String, Provenance) {
    if let Some(opening) = book {
        return (opening.name.clone(), Provenance::Direct);
    }

    // only a single move suffix
    if parent.provenance != Provenance::Direct {
        return (parent.opening_name.clone(), Provenance::FromAncestor);
    }

    if parent.turn != repertoire_color {
        return (parent.opening_name.clone(), Provenance::Direct);
    }

    let name = format!(
        "{}, {} {}",
        parent.opening_name,
        move_number_prefix(parent.move_num, parent.turn),
        mv
    );
    (name, Provenance::FromParent)
}

/// ECO code for the position reached from `parent`; never suffixed
pub fn opening_eco(book: Option<&Opening>, parent: &DagNode) -> String {
    match book {
        Some(opening) => opening.eco.clone(),
        None => parent.eco.clone(),
    }
}
