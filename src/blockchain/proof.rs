use sha2::{Digest, Sha256};

/// Default number of leading hex zeros a proof hash must have
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Proof-of-work engine
///
/// A proof `p` is valid for the previous proof `last` when
/// `sha256(format!("{last}{p}"))` in hex starts with `difficulty` zeros.
/// Searching and validating share [`ProofOfWork::meets_target`], so they can
/// never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    /// Number of leading hex zeros required in the guess hash
    difficulty: usize,
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork::new(DEFAULT_DIFFICULTY)
    }
}

impl ProofOfWork {
    /// Creates an engine with the given difficulty
    pub fn new(difficulty: usize) -> Self {
        ProofOfWork { difficulty }
    }

    /// Returns the configured difficulty
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Finds the smallest proof valid for `last_proof`
    ///
    /// Linear search from 0 with no upper bound. This blocks the calling
    /// thread until a proof is found, so async callers should run it on a
    /// blocking worker.
    pub fn find_proof(&self, last_proof: u64) -> u64 {
        let mut proof = 0;

        while !self.is_valid_proof(last_proof, proof) {
            proof += 1;
        }

        proof
    }

    /// Checks whether `proof` is valid for `last_proof`
    pub fn is_valid_proof(&self, last_proof: u64, proof: u64) -> bool {
        self.meets_target(&guess_hash(last_proof, proof))
    }

    fn meets_target(&self, hash: &str) -> bool {
        hash.len() >= self.difficulty && hash.bytes().take(self.difficulty).all(|b| b == b'0')
    }
}

/// Hex SHA-256 of the decimal concatenation of both proofs
pub fn guess_hash(last_proof: u64, proof: u64) -> String {
    let guess = format!("{}{}", last_proof, proof);

    let mut hasher = Sha256::new();
    hasher.update(guess.as_bytes());

    hex::encode(hasher.finalize())
}
