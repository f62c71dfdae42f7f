use crate::error::{Error, Result};

/// FEN of the standard starting position
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Normalize a FEN by zeroing the halfmove clock and resetting the full-move
/// number to 1.
///
/// Board, side to move, castling rights and en-passant square pass through
/// unchanged. Used for opening-book lookups and repertoire move maps; the DAG
/// itself keys nodes on the exact FEN.
pub fn normalize_fen(fen: &str) -> Result<String> {
    let fields: Vec<&str> = fen.split(' ').collect();
    if fields.len() != 6 {
        return Err(Error::InvalidFen {
            fen: fen.to_string(),
            fields: fields.len(),
        });
    }

    Ok(format!(
        "{} {} {} {} 0 1",
        fields[0], fields[1], fields[2], fields[3]
    ))
}

/// Board-only portion of a FEN (piece placement field)
pub fn board_fen(fen: &str) -> &str {
    fen.split(' ').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counters are reset, everything else is kept
    #[test]
    fn test_normalize_fen_resets_counters() {
        let fen = "rnbqkb1r/pp2pppp/2p2n2/3p4/2PP4/2N2N2/PP2PPPP/R1BQKB1R b KQkq - 3 4";
        let normalized = normalize_fen(fen).unwrap();
        assert_eq!(
            normalized,
            "rnbqkb1r/pp2pppp/2p2n2/3p4/2PP4/2N2N2/PP2PPPP/R1BQKB1R b KQkq - 0 1"
        );
    }

    /// En-passant square and castling rights survive normalization
    #[test]
    fn test_normalize_fen_keeps_en_passant() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w Kq e6 0 2";
        assert_eq!(
            normalize_fen(fen).unwrap(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w Kq e6 0 1"
        );
    }

    /// Normalizing twice is the same as normalizing once
    #[test]
    fn test_normalize_fen_is_stable() {
        let once = normalize_fen(STARTING_FEN).unwrap();
        assert_eq!(once, STARTING_FEN);
        assert_eq!(normalize_fen(&once).unwrap(), once);
    }

    /// Anything that is not six fields is rejected
    #[test]
    fn test_normalize_fen_rejects_wrong_field_count() {
        let result = normalize_fen("");
        assert!(result.is_err(), "empty FEN must not normalize");

        match normalize_fen("8/8/8/8/8/8/8/8 w - -") {
            Err(Error::InvalidFen { fields, .. }) => assert_eq!(fields, 4),
            other => panic!("expected InvalidFen, got {:?}", other),
        }
    }

    #[test]
    fn test_board_fen() {
        assert_eq!(board_fen(STARTING_FEN), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        assert_eq!(board_fen(""), "");
    }
}
