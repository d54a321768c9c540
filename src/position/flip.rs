//! Color-mirroring of FEN strings.

/// Mirrors a FEN: ranks reversed, piece colors and side to move swapped,
/// castling rights and the en-passant square mirrored. Move counters are kept.
///
/// Returns `None` when the FEN has fewer than the four mandatory fields.
#[must_use]
pub fn flip_fen(fen: &str) -> Option<String> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next()?;
    let side = fields.next()?;
    let castling = fields.next()?;
    let en_passant = fields.next()?;
    let counters: Vec<&str> = fields.collect();

    let placement = placement
        .split('/')
        .rev()
        .map(swap_case)
        .collect::<Vec<_>>()
        .join("/");

    let side = if side == "w" { "b" } else { "w" };

    let castling = if castling == "-" {
        castling.to_string()
    } else {
        let swapped = swap_case(castling);
        let (upper, lower): (String, String) = swapped.chars().partition(char::is_ascii_uppercase);
        upper + &lower
    };

    let en_passant = match en_passant.as_bytes() {
        [file, rank] => {
            let rank = if *rank == b'3' { '6' } else { '3' };
            format!("{}{rank}", char::from(*file))
        }
        _ => en_passant.to_string(),
    };

    let mut flipped = format!("{placement} {side} {castling} {en_passant}");
    for counter in counters {
        flipped.push(' ');
        flipped.push_str(counter);
    }
    Some(flipped)
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}
