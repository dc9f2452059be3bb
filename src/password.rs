//! Throwaway password generation for PKCS#12 exports.
//!
//! The generated password only has to satisfy the remote system's complexity
//! validator when the caller supplies none. It is not an audited secret
//! generator.

use bon::Builder;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

/// The character sets passwords are drawn from.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct Alphabet {
    #[builder(default = "abcdefghijklmnopqrstuvwxyz".chars().collect::<Vec<_>>())]
    pub lower: Vec<char>,
    #[builder(default = "ABCDEFGHIJKLMNOPQRSTUVWXYZ".chars().collect::<Vec<_>>())]
    pub upper: Vec<char>,
    #[builder(default = "0123456789".chars().collect::<Vec<_>>())]
    pub digits: Vec<char>,
    #[builder(default = "!@#$%&*".chars().collect::<Vec<_>>())]
    pub special: Vec<char>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Alphabet {
    fn union(&self) -> Vec<char> {
        self.lower
            .iter()
            .chain(&self.upper)
            .chain(&self.digits)
            .chain(&self.special)
            .copied()
            .collect()
    }
}

/// Composition policy for generated passwords.
///
/// When `length` is smaller than the sum of the minimums the remaining fill is
/// empty and the password is longer than `length`.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct PasswordPolicy {
    #[builder(default = 18)]
    pub length: usize,
    #[builder(default = 2)]
    pub special_min: usize,
    #[builder(default = 2)]
    pub digit_min: usize,
    #[builder(default = 2)]
    pub upper_min: usize,
    #[builder(default)]
    pub alphabet: Alphabet,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PasswordPolicy {
    /// Number of characters drawn from the full alphabet after the minimums.
    pub fn remaining_fill(&self) -> usize {
        self.length
            .saturating_sub(self.special_min)
            .saturating_sub(self.digit_min)
            .saturating_sub(self.upper_min)
    }
}

/// Generates a password for `policy` using the thread-local RNG.
pub fn generate(policy: &PasswordPolicy) -> String {
    generate_with(policy, &mut rand::rng())
}

/// Generates a password for `policy` drawing from `rng`.
pub fn generate_with<R: Rng + ?Sized>(policy: &PasswordPolicy, rng: &mut R) -> String {
    let alphabet = &policy.alphabet;
    let all = alphabet.union();

    let mut chars: Vec<char> = Vec::with_capacity(policy.length);
    push_random(&mut chars, &alphabet.special, policy.special_min, rng);
    push_random(&mut chars, &alphabet.digits, policy.digit_min, rng);
    push_random(&mut chars, &alphabet.upper, policy.upper_min, rng);
    push_random(&mut chars, &all, policy.remaining_fill(), rng);

    chars.shuffle(rng);
    chars.into_iter().collect()
}

fn push_random<R: Rng + ?Sized>(out: &mut Vec<char>, set: &[char], count: usize, rng: &mut R) {
    // An empty set contributes nothing.
    out.extend((0..count).filter_map(|_| set.choose(&mut *rng).copied()));
}
