//! Combinational 8b/10b coder.
//!
//! Based on US Patent # 4,486,739 (expired)
//! Byte Oriented DC Balanced 8B/10B Partitioned Block Transmission Code
//! Author: Franaszek et al.
//!
//! <https://patentimages.storage.googleapis.com/67/2d/ad/0258c2f0d807bf/US4486739.pdf>
//!
//! Used once to build the lookup tables, and as the reference the tables are checked against.

#![allow(non_snake_case)]

use crate::types::Symbol;

/// Output of [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EncodeOut {
    pub(crate) symbol: Symbol,
    pub(crate) rd: bool,
    pub(crate) kerr: bool,
}

/// Output of [`decode`].
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecodeOut {
    pub(crate) data: u8,
    pub(crate) k: bool,
    pub(crate) rd: bool,
    pub(crate) data_err: bool,
    pub(crate) rd_err: bool,
}

fn bit(value: u16, index: u32) -> bool { (value >> index) & 1 == 1 }

fn pack(bits: &[bool]) -> u16 { bits.iter().enumerate().fold(0, |acc, (i, b)| acc | (u16::from(*b) << i)) }

pub(crate) fn encode(data: u8, k_i: bool, rd_i: bool) -> EncodeOut {
    let data_i = u16::from(data);

    let A = bit(data_i, 0);
    let B = bit(data_i, 1);
    let C = bit(data_i, 2);
    let D = bit(data_i, 3);
    let E = bit(data_i, 4);
    let F = bit(data_i, 5);
    let G = bit(data_i, 6);
    let H = bit(data_i, 7);

    // From FIG. 3
    let AxorB = A ^ B;
    let CxorD = C ^ D;
    let AandB = A & B;
    let CandD = C & D;
    let NAandNB = !A & !B;
    let NCandND = !C & !D;

    let L22 = (AandB & NCandND) | (CandD & NAandNB) | (AxorB & CxorD);
    let L40 = AandB & CandD;
    let L04 = NAandNB & NCandND;
    let L13 = (AxorB & NCandND) | (CxorD & NAandNB);
    let L31 = (AxorB & CandD) | (CxorD & AandB);

    // From FIG. 4
    let FxorG = F ^ G;
    let FandG = F & G;
    let NFandNG = !F & !G;
    let NFandNGandNH = NFandNG & !H;
    let FxorGandK = FxorG & k_i;
    let FxorGandNH = FxorG & !H;
    let FandGandH = FandG & H;

    let S = (rd_i & L31 & D & !E) | (!rd_i & L13 & !D & E);

    // From FIG. 5
    let T0 = L13 & D & E;

    let PDM1S6 = T0 | (!L22 & !L31 & !E);
    let ND0S6 = PDM1S6;
    let PD0S6 = (E & !L22 & !L13) | k_i;
    let NDM1S6 = (L31 & !D & !E) | PD0S6;
    let NDM1S4 = FandG;
    let ND0S4 = NFandNG;
    let PDM1S4 = NFandNG | FxorGandK;
    let PD0S4 = FandGandH;

    // From FIG. 6
    let COMPLS6 = (NDM1S6 & rd_i) | (!rd_i & PDM1S6);
    let NDL6 = (PD0S6 & !COMPLS6) | (COMPLS6 & ND0S6) | (!ND0S6 & !PD0S6 & rd_i);
    let COMPLS4 = (NDM1S4 & NDL6) | (!NDL6 & PDM1S4);

    let rd_o = (NDL6 & !PD0S4 & !ND0S4) | (ND0S4 & COMPLS4) | (!COMPLS4 & PD0S4);

    // From FIG. 7
    let N0 = A;
    let N1 = (!L40 & B) | L04;
    let N2 = (L04 | C) | T0;
    let N3 = D & !L40;
    let N4 = (!T0 & E) | (!E & L13);
    let N5 = (!E & L22) | (L22 & k_i) | (L04 & E) | (E & L40) | (E & L13 & !D);

    // From FIG. 8
    let T1 = (S & FandGandH) | (FandGandH & k_i);

    let N6 = !(!F | T1);
    let N7 = G | NFandNGandNH;
    let N8 = H;
    let N9 = T1 | FxorGandNH;

    // Not in patent
    let kerr_o = k_i & !(NAandNB & CandD & E) & !(FandGandH & E & L31);

    let symbol = pack(&[
        N0 ^ COMPLS6,
        N1 ^ COMPLS6,
        N2 ^ COMPLS6,
        N3 ^ COMPLS6,
        N4 ^ COMPLS6,
        N5 ^ COMPLS6,
        N6 ^ COMPLS4,
        N7 ^ COMPLS4,
        N8 ^ COMPLS4,
        N9 ^ COMPLS4,
    ]);

    EncodeOut { symbol, rd: rd_o, kerr: kerr_o }
}

#[cfg(test)]
pub(crate) fn decode(symbol: Symbol, rd_i: bool) -> DecodeOut {
    let A = bit(symbol, 0);
    let B = bit(symbol, 1);
    let C = bit(symbol, 2);
    let D = bit(symbol, 3);
    let E = bit(symbol, 4);
    let I = bit(symbol, 5);
    let F = bit(symbol, 6);
    let G = bit(symbol, 7);
    let H = bit(symbol, 8);
    let J = bit(symbol, 9);

    // Commonly found functions (some in patent, others are not)
    let AxorB = A ^ B;
    let AandB = A & B;
    let NAandNB = !A & !B;

    let CxorD = C ^ D;
    let CandD = C & D;
    let NCandND = !C & !D;

    let ExnorI = !(E ^ I);
    let EandI = E & I;
    let NEandNI = !E & !I;

    let FxorG = F ^ G;
    let FandG = F & G;
    let NFandNG = !F & !G;

    let HxorJ = H ^ J;
    let HandJ = H & J;
    let NHandNJ = !H & !J;

    // From FIG. 10
    let P22 = (AandB & NCandND) | (CandD & NAandNB) | (AxorB & CxorD);
    let P13 = (AxorB & NCandND) | (CxorD & NAandNB);
    let P31 = (AxorB & CandD) | (CxorD & AandB);

    // From FIG. 11
    let N0 = P22 & A & C & ExnorI;
    let N1 = P22 & !A & !C & ExnorI;
    let N2 = P22 & B & C & ExnorI;
    let N3 = P22 & !B & !C & ExnorI;
    let N4 = NAandNB & NEandNI;
    let N5 = AandB & EandI;
    let N6 = P13 & D & EandI;
    let N7 = P13 & !I;
    let N8 = P13 & !E;
    let N9 = P31 & I;

    let N10 = CandD & EandI;
    let N11 = NCandND & NEandNI;
    let N12 = !E & I & G & HandJ;
    let N13 = E & !I & !G & NHandNJ;

    let k_o = (N10 | N11) | (N12 & P13) | (N13 & P31);

    // From FIG. 12
    let M0 = N1 | N8;
    let M1 = N5 | N11 | N9;
    let M2 = N9 | N2 | N6;
    let M3 = N0 | N8;
    let M4 = N8 | N11 | N4;
    let M5 = N1 | N7;
    let M6 = N6 | N3;

    let T0 = M6 | M0 | M1;
    let T1 = M1 | M3 | M2;
    let T2 = M2 | M0 | M4;
    let T3 = M1 | M3 | M6;
    let T4 = M5 | M4 | M6;

    // From FIG. 13
    let N14 = G & HandJ;
    let N15 = HandJ & F;
    let N16 = FandG & J;
    let N17 = NFandNG & !H;
    let N18 = NFandNG & HandJ;
    let N19 = !F & NHandNJ;
    let N20 = NHandNJ & !G;
    let N21 = !HandJ & !NHandNJ & N11;

    let M7 = N14 | N15 | N21;
    let M8 = N16 | N17 | N18;
    let M9 = N19 | N21 | N20;
    let M10 = N20 | N15 | N21;

    let T5 = M7 | M8;
    let T6 = M8 | M9;
    let T7 = M8 | M10;

    // Everything else is not found in the patent

    let rd6p = (P31 & !NEandNI) | (P22 & EandI); // 5b/6b code disparity +2
    let rd6n = (P13 & !EandI) | (P22 & NEandNI); // 5b/6b code disparity -2
    let rd4p = (FxorG & HandJ) | (HxorJ & FandG); // 3b/4b code disparity +2
    let rd4n = (FxorG & NHandNJ) | (HxorJ & NFandNG); // 3b/4b code disparity -2

    let rd_o = !NHandNJ
        & (rd4p
            | HandJ
            | (((D | !NEandNI)
                & ((rd_i & P31) | ((rd_i | !P13) & EandI) | (((rd_i & P22) | P31) & !(NEandNI)) | (D & EandI)))
                & ((FandG & NHandNJ) | N18 | (FxorG & HxorJ))));

    let data_err_o = (NAandNB & NCandND)
        | (AandB & CandD)
        | (NFandNG & NHandNJ)
        | (FandG & HandJ)
        | (EandI & FandG & H)
        | (NEandNI & N17)
        | (E & !I & N14)
        | (!E & I & N20)
        | (!P31 & N13)
        | (!P13 & N12)
        | (N7 & !E)
        | (N9 & E)
        | (FandG & NHandNJ & rd6p)
        | (N18 & rd6n)
        | (N10 & N17)
        | (N11 & FandG & H)
        | (rd6p & rd4p)
        | (rd6n & rd4n)
        | (AandB & C & NEandNI & (NFandNG | rd4n))
        | (NAandNB & !C & EandI & (FandG | rd4p))
        | (((EandI & N20) | (NEandNI & N14)) & !(CandD & E) & !(NCandND & !E));

    // Running disparity errors detection
    let rd_err_o = (rd6p & rd4p) | (rd6n & rd4n) // Delta disparity check
        | (rd_i & rd6p) | (!rd_i & rd6n) // Disparity check for 5b/6b code
        | (rd_i & !rd6n & FandG) | (!rd_i & !rd6p & NFandNG) // Disparity check for 3b/4b code
        | (rd_i & !rd6n & rd4p) | (!rd_i & !rd6p & rd4n) // Resulting disparity check
        | (rd_i & AandB & C) | (!rd_i & NAandNB & !C); // Additional check

    let data = pack(&[A ^ T0, B ^ T1, C ^ T2, D ^ T3, E ^ T4, F ^ T5, G ^ T6, H ^ T7]) as u8;

    DecodeOut { data, k: k_o, rd: rd_o, data_err: data_err_o, rd_err: rd_err_o }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COM_RDN, COM_RDP};

    #[test]
    fn encodes_comma_in_both_disparities() {
        assert_eq!(encode(0xbc, true, false), EncodeOut { symbol: COM_RDN, rd: true, kerr: false });
        assert_eq!(encode(0xbc, true, true), EncodeOut { symbol: COM_RDP, rd: false, kerr: false });
    }

    #[test]
    fn balanced_data_keeps_disparity() {
        // D21.5 is 101010 1010 in both disparities.
        let out = encode(0xb5, false, false);
        assert_eq!(out.symbol, 0b01_0101_0101);
        assert!(!out.rd);
    }

    #[test]
    fn rejects_unassigned_control() {
        assert!(encode(0x00, true, false).kerr);
        assert!(!encode(0xfb, true, false).kerr); // K27.7
    }

    #[test]
    fn decodes_comma() {
        let out = decode(COM_RDN, false);
        assert_eq!((out.data, out.k, out.data_err, out.rd_err), (0xbc, true, false, false));
    }
}
