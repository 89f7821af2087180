//! Trade word decoder.
//!
//! Every trade arrives packed into a single 32-bit FIFO word:
//!
//! | Bits  | Width | Field    | Description               |
//! |-------|-------|----------|---------------------------|
//! | 31    | 1     | side     | 1 = BUY, 0 = SELL         |
//! | 16–30 | 15    | quantity | unsigned                  |
//! | 0–15  | 16    | price    | unsigned                  |
//!
//! The masks cover every bit, so decoding is total: any word is a valid
//! trade.

use tb_core::{RawWord, Side, TradeRecord};

const SIDE_BIT: u32 = 1 << 31;
const QUANTITY_SHIFT: u32 = 16;
const QUANTITY_MASK: u32 = 0x7FFF;
const PRICE_MASK: u32 = 0xFFFF;

/// Decode one FIFO word into a trade.
#[inline]
pub fn decode(word: RawWord) -> TradeRecord {
    let side = if word & SIDE_BIT != 0 { Side::Buy } else { Side::Sell };
    TradeRecord {
        side,
        quantity: ((word >> QUANTITY_SHIFT) & QUANTITY_MASK) as u16,
        price: (word & PRICE_MASK) as u16,
    }
}

/// Pack a trade back into its FIFO word. Quantity bits above 15 are dropped.
#[inline]
pub fn encode(record: &TradeRecord) -> RawWord {
    let side = match record.side {
        Side::Buy => SIDE_BIT,
        Side::Sell => 0,
    };
    side | ((record.quantity as u32 & QUANTITY_MASK) << QUANTITY_SHIFT) | record.price as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_word() {
        let rec = decode(0x8001_0064);
        assert_eq!(rec, TradeRecord { side: Side::Buy, quantity: 1, price: 100 });
    }

    #[test]
    fn zero_word_is_empty_sell() {
        assert_eq!(decode(0), TradeRecord { side: Side::Sell, quantity: 0, price: 0 });
    }

    #[test]
    fn all_ones_saturates_fields() {
        assert_eq!(decode(u32::MAX), TradeRecord { side: Side::Buy, quantity: 0x7FFF, price: 0xFFFF });
    }

    #[test]
    fn fields_follow_masks() {
        // Walk a spread of words, including every single-bit pattern.
        let words = (0..32).map(|b| 1u32 << b).chain((0..10_000u32).map(|i| i.wrapping_mul(0x9E37_79B9)));
        for w in words {
            let rec = decode(w);
            assert_eq!(rec.side == Side::Buy, w >> 31 == 1, "w={w:#010x}");
            assert_eq!(rec.quantity as u32, (w >> 16) & 0x7FFF, "w={w:#010x}");
            assert_eq!(rec.price as u32, w & 0xFFFF, "w={w:#010x}");
        }
    }

    #[test]
    fn encode_inverts_decode() {
        for side in [Side::Buy, Side::Sell] {
            for quantity in [0u16, 1, 255, 0x4000, 0x7FFE, 0x7FFF] {
                for price in [0u16, 1, 100, 0x8000, 0xFFFF] {
                    let rec = TradeRecord { side, quantity, price };
                    assert_eq!(decode(encode(&rec)), rec);
                }
            }
        }
    }

    #[test]
    fn encode_drops_bit_15_of_quantity() {
        let rec = TradeRecord { side: Side::Sell, quantity: 0x8001, price: 7 };
        assert_eq!(encode(&rec), 0x0001_0007);
    }
}
