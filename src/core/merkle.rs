use crate::core::Transaction;
use sha2::{Digest, Sha256};

/// Merkle root of a transaction list: a SHA-256 binary tree built by
/// split-at-middle recursion. The empty list hashes to all zeros and a
/// single node is its own root.
pub fn merkle_root(transactions: &[Transaction]) -> [u8; 32] {
    let nodes: Vec<[u8; 32]> = transactions.iter().map(|tx| tx.hash()).collect();
    root_of(&nodes)
}

fn root_of(nodes: &[[u8; 32]]) -> [u8; 32] {
    if nodes.is_empty() {
        return [0u8; 32];
    }
    if nodes.len() == 1 {
        return nodes[0];
    }

    let middle = nodes.len() / 2;
    let left = root_of(&nodes[..middle]);
    let right = root_of(&nodes[middle..]);

    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sha256_digest;

    fn pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
        let mut joined = Vec::with_capacity(64);
        joined.extend_from_slice(a);
        joined.extend_from_slice(b);
        sha256_digest(&joined)
    }

    #[test]
    fn test_empty_list_is_zero() {
        assert_eq!(root_of(&[]), [0u8; 32]);
    }

    #[test]
    fn test_single_node_is_itself() {
        let node = sha256_digest(b"only");
        assert_eq!(root_of(&[node]), node);
    }

    #[test]
    fn test_three_nodes_split_at_middle() {
        let a = sha256_digest(b"a");
        let b = sha256_digest(b"b");
        let c = sha256_digest(b"c");

        // n/2 = 1: the left half is [a] alone, the right half pairs b and c
        let expected = pair(&a, &pair(&b, &c));
        assert_eq!(root_of(&[a, b, c]), expected);
    }

    #[test]
    fn test_four_nodes() {
        let nodes: Vec<[u8; 32]> = [b"a", b"b", b"c", b"d"]
            .iter()
            .map(|n| sha256_digest(*n))
            .collect();

        let expected = pair(&pair(&nodes[0], &nodes[1]), &pair(&nodes[2], &nodes[3]));
        assert_eq!(root_of(&nodes), expected);
    }
}
