//! Fixed seed table for reproducible ensemble construction.

use crate::EvalError;

/// Seeds used by [`SeedSequence::fixed`], in consumption order.
const FIXED_SEEDS: [u64; 200] = [
    342317953, 521642753, 72070657, 577451521, 266953217, 179976193, 374603777, 527788033,
    303395329, 185759582, 261518209, 461300737, 483646580, 532528741, 159827201, 284796929,
    655932697, 26390017, 454330473, 867526205, 824623361, 719082324, 334008833, 699933293,
    823964929, 155216641, 150210071, 249486337, 713508520, 558398977, 886227770, 74062428,
    670528514, 701250241, 363339915, 319216345, 757017601, 459643789, 170213767, 434634241,
    414707201, 153100613, 753882113, 546490145, 412517763, 888761089, 628632833, 565587585,
    175885057, 594903553, 78450978, 212995578, 710952449, 835852289, 415422977, 832538705,
    624345857, 839826433, 260963602, 386066438, 530942946, 261866663, 269735895, 798436064,
    379576194, 251582977, 349161809, 179653121, 218870401, 415292417, 86861523, 570214657,
    701581299, 805955890, 358025785, 231452966, 584239408, 297276298, 371814913, 159451160,
    284126095, 896291329, 496278529, 556314113, 31607297, 726761729, 217004033, 390410146,
    70173193, 661580775, 633589889, 389049037, 112099159, 54041089, 80388281, 492196097,
    912179201, 699398161, 482080769, 363844609, 286008078, 398098433, 339855361, 189583553,
    697670495, 709568513, 98494337, 99107427, 433350529, 266601473, 888120086, 243906049,
    414781441, 154685953, 601194298, 292273153, 212413697, 568007473, 666386113, 712261633,
    802026964, 783034790, 188095005, 742646355, 550352897, 209421313, 175672961, 242531185,
    157584001, 201363231, 760741889, 852924929, 60158977, 774572033, 311159809, 407214966,
    804474160, 304456514, 54251009, 504009638, 902115329, 870383757, 487243777, 635554282,
    564918017, 636074753, 870308031, 817515521, 494471884, 562424321, 81710593, 476321537,
    595107841, 418699893, 315560449, 773617153, 163266399, 274201241, 290857537, 879955457,
    801949697, 669025793, 753107969, 424060977, 661877468, 433391617, 222716929, 334154852,
    878528257, 253742849, 480885528, 99773953, 913761493, 700407809, 483418083, 487870398,
    58433153, 608046337, 475342337, 506376199, 378726401, 306604033, 724646374, 895195218,
    523634541, 766543466, 190068097, 718704641, 254519245, 393943681, 796689751, 379497473,
    50014340, 489234689, 129556481, 178766593, 142540536, 213594113, 870440184, 277912577,
];

/// An immutable, ordered list of seeds consumed from the start.
///
/// Every fit takes the seeds it needs from the head of the sequence, so
/// two fits with the same parameters see the same seeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSequence {
    seeds: Vec<u64>,
}

impl SeedSequence {
    /// The 200-seed table every evaluation uses by default.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            seeds: FIXED_SEEDS.to_vec(),
        }
    }

    /// Build a custom sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::EmptySeedSequence`] if `seeds` is empty.
    pub fn from_seeds(seeds: Vec<u64>) -> Result<Self, EvalError> {
        if seeds.is_empty() {
            return Err(EvalError::EmptySeedSequence);
        }
        Ok(Self { seeds })
    }

    /// Return the first `n` seeds.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::SeedsExhausted`] if the sequence is shorter than `n`.
    pub fn take(&self, n: usize) -> Result<&[u64], EvalError> {
        self.seeds.get(..n).ok_or(EvalError::SeedsExhausted {
            requested: n,
            available: self.seeds.len(),
        })
    }

    /// Return the number of seeds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Return `true` if the sequence has no seeds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Return every seed in order.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.seeds
    }
}

impl Default for SeedSequence {
    fn default() -> Self {
        Self::fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_table_shape() {
        let seeds = SeedSequence::fixed();
        assert_eq!(seeds.len(), 200);
        assert_eq!(seeds.as_slice()[0], 342317953);
        assert_eq!(seeds.as_slice()[199], 277912577);
    }

    #[test]
    fn take_is_a_prefix() {
        let seeds = SeedSequence::fixed();
        assert_eq!(seeds.take(3).unwrap(), &[342317953, 521642753, 72070657]);
        assert_eq!(seeds.take(200).unwrap().len(), 200);
        assert_eq!(seeds.take(0).unwrap(), &[] as &[u64]);
    }

    #[test]
    fn take_past_end_fails() {
        let seeds = SeedSequence::from_seeds(vec![1, 2]).unwrap();
        assert!(matches!(
            seeds.take(3),
            Err(EvalError::SeedsExhausted {
                requested: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn empty_sequence_rejected() {
        assert!(matches!(
            SeedSequence::from_seeds(Vec::new()),
            Err(EvalError::EmptySeedSequence)
        ));
    }
}
