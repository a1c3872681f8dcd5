//! Internet checksum (RFC 1071) implementations for `IPv4` and `TCP` over `IPv4`.
//!
//! The word summing approach is derived from [`libpnet`] which is available under the Apache 2.0
//! license.
//!
//! [`libpnet`]: https://github.com/libpnet/libpnet

use crate::IpProtocol;
use std::net::Ipv4Addr;

/// The 16-bit word index of the checksum within an `IPv4` header.
const IPV4_CHECKSUM_WORD: usize = 5;

/// The 16-bit word index of the checksum within a `TCP` header.
const TCP_CHECKSUM_WORD: usize = 8;

/// Size in bytes of the `IPv4` pseudo-header used by upper layer checksums.
pub const IPV4_PSEUDO_HEADER_SIZE: usize = 12;

/// Calculate the Internet checksum of an arbitrary byte buffer.
///
/// All big-endian 16-bit words are summed, carries are folded back into the low 16 bits until
/// none remain and the one's complement of the result is returned. A buffer of odd length is
/// treated as if padded with a trailing zero byte.
///
/// Computing the checksum of a buffer which already contains its correct checksum yields zero.
#[must_use]
pub fn internet_checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data, None))
}

/// Calculate the checksum for an `IPv4` header.
///
/// The checksum field of the header (bytes 10 and 11) is ignored.
#[must_use]
pub fn ipv4_header_checksum(data: &[u8]) -> u16 {
    finalize_checksum(sum_be_words(data, Some(IPV4_CHECKSUM_WORD)))
}

/// Calculate the checksum for an `IPv4` `TCP` segment.
///
/// The checksum covers the `IPv4` pseudo-header followed by the segment, the checksum field of
/// the segment (bytes 16 and 17) is ignored.
///
/// A segment longer than `u16::MAX` bytes cannot be carried by `IPv4`; its length still takes
/// part in the sum in full, as two 16-bit words.
#[must_use]
pub fn tcp_ipv4_checksum(data: &[u8], src_addr: Ipv4Addr, dest_addr: Ipv4Addr) -> u16 {
    let sum = pseudo_header_sum(src_addr, dest_addr, IpProtocol::Tcp, data.len())
        + sum_be_words(data, Some(TCP_CHECKSUM_WORD));
    finalize_checksum(sum)
}

/// Build the `IPv4` pseudo-header for an upper layer protocol segment of `length` bytes.
///
/// The pseudo-header is never transmitted, it only takes part in the checksum.
#[must_use]
pub fn ipv4_pseudo_header(
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    protocol: IpProtocol,
    length: u16,
) -> [u8; IPV4_PSEUDO_HEADER_SIZE] {
    let mut header = [0_u8; IPV4_PSEUDO_HEADER_SIZE];
    header[0..4].copy_from_slice(&src_addr.octets());
    header[4..8].copy_from_slice(&dest_addr.octets());
    header[9] = protocol.id();
    header[10..12].copy_from_slice(&length.to_be_bytes());
    header
}

/// Sum the words of the pseudo-header without building it, so that `length` is never truncated.
fn pseudo_header_sum(
    src_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    protocol: IpProtocol,
    length: usize,
) -> u64 {
    let length = length as u64;
    sum_be_words(&src_addr.octets(), None)
        + sum_be_words(&dest_addr.octets(), None)
        + u64::from(protocol.id())
        + (length >> 16)
        + (length & 0xFFFF)
}

/// Sum big-endian 16-bit words.
///
/// The sum is held in a `u64` which cannot overflow for any buffer that fits in memory.
fn sum_be_words(data: &[u8], ignore_word: Option<usize>) -> u64 {
    let mut chunks = data.chunks_exact(2);
    let mut sum = chunks
        .by_ref()
        .enumerate()
        .filter(|(i, _)| Some(*i) != ignore_word)
        .map(|(_, word)| u64::from(u16::from_be_bytes([word[0], word[1]])))
        .sum::<u64>();
    if let [last] = chunks.remainder() {
        if Some(data.len() / 2) != ignore_word {
            sum += u64::from(*last) << 8;
        }
    }
    sum
}

const fn finalize_checksum(mut sum: u64) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::str::FromStr;

    #[test]
    fn test_empty_checksum() {
        let src_addr = Ipv4Addr::from_str("192.168.1.201").unwrap();
        let dest_addr = Ipv4Addr::from_str("142.250.66.46").unwrap();
        assert_eq!(0xffff, internet_checksum(&[]));
        assert_eq!(0xffff, ipv4_header_checksum(&[]));
        assert_eq!(27743, tcp_ipv4_checksum(&[], src_addr, dest_addr));
    }

    #[test]
    fn test_odd_length() {
        assert_eq!(65535, ipv4_header_checksum(&[0x00]));
        assert_eq!(!0x0100, internet_checksum(&[0x01]));
        assert_eq!(!0x1234_u16.wrapping_add(0x5600), internet_checksum(&hex!("12 34 56")));
    }

    #[test]
    fn test_carry_is_folded() {
        // 0xffff + 0x0001 = 0x10000 which folds to 0x0001
        assert_eq!(!0x0001, internet_checksum(&hex!("ff ff 00 01")));
        // 0xffff + 0xffff + 0xffff = 0x2fffd which folds to 0xffff
        assert_eq!(0x0000, internet_checksum(&hex!("ff ff ff ff ff ff")));
    }

    #[test]
    fn test_large_buffer() {
        assert_eq!(0x0000, internet_checksum(&vec![0xff; 200_000]));
        let words = [0x00, 0x01].repeat(100_000);
        // 100000 = 0x186a0 which folds to 0x86a1
        assert_eq!(!0x86a1, internet_checksum(&words));
    }

    #[test]
    fn test_tcp_ipv4_checksum_large_segment() {
        let src_addr = Ipv4Addr::new(10, 0, 0, 1);
        let dest_addr = Ipv4Addr::new(10, 0, 0, 2);
        let segment = vec![0xff; 200_000];
        // 200000 = 0x30d40, summed as the words 0x0003 and 0x0d40
        let mut expected = hex!("0a 00 00 01 0a 00 00 02 00 06 00 03 0d 40").to_vec();
        let mut zeroed = segment.clone();
        zeroed[16..18].copy_from_slice(&[0, 0]);
        expected.extend_from_slice(&zeroed);
        assert_eq!(
            internet_checksum(&expected),
            tcp_ipv4_checksum(&segment, src_addr, dest_addr)
        );
    }

    #[test]
    fn test_ipv4_header_checksum() {
        let bytes = hex!("45 00 0f fc 38 c0 00 00 40 01 2e 3b 0a 00 00 02 0a 00 00 01");
        assert_eq!(0x1e3f, ipv4_header_checksum(&bytes));
    }

    #[test]
    fn test_ipv4_header_checksum_ignores_checksum_field() {
        let bytes = hex!("45 00 00 28 75 30 00 00 01 06 00 00 c0 a8 01 77 5d b8 d8 22");
        let mut filled = bytes;
        filled[10..12].copy_from_slice(&[0xaa, 0xbb]);
        assert_eq!(0x4ca6, ipv4_header_checksum(&bytes));
        assert_eq!(0x4ca6, ipv4_header_checksum(&filled));
    }

    #[test]
    fn test_ipv4_header_self_verifies() {
        let mut bytes = hex!("45 00 00 28 75 30 00 00 01 06 00 00 c0 a8 01 77 5d b8 d8 22");
        let checksum = ipv4_header_checksum(&bytes);
        bytes[10..12].copy_from_slice(&checksum.to_be_bytes());
        assert_eq!(0, internet_checksum(&bytes));
    }

    #[test]
    fn test_tcp_ipv4_checksum() {
        let bytes = hex!("00 50 80 ea 00 00 00 00 95 9d 2e c7 50 12 ff ff 55 cc 00 00");
        assert_eq!(
            0x55cc,
            tcp_ipv4_checksum(
                &bytes,
                Ipv4Addr::new(10, 0, 0, 103),
                Ipv4Addr::new(10, 0, 0, 1)
            )
        );
    }

    #[test]
    fn test_tcp_syn_ipv4_checksum() {
        let bytes = hex!("d6 d8 82 9a 00 00 03 e8 00 00 00 00 50 02 20 00 00 00 00 00");
        assert_eq!(
            0x3a8d,
            tcp_ipv4_checksum(
                &bytes,
                Ipv4Addr::new(192, 168, 1, 119),
                Ipv4Addr::new(93, 184, 216, 34)
            )
        );
    }

    #[test]
    fn test_tcp_pseudo_header_self_verifies() {
        let src_addr = Ipv4Addr::new(192, 168, 1, 119);
        let dest_addr = Ipv4Addr::new(93, 184, 216, 34);
        let mut segment = hex!("d6 d8 82 9a 00 00 03 e8 00 00 00 00 50 02 20 00 00 00 00 00");
        let checksum = tcp_ipv4_checksum(&segment, src_addr, dest_addr);
        segment[16..18].copy_from_slice(&checksum.to_be_bytes());
        let pseudo = ipv4_pseudo_header(src_addr, dest_addr, IpProtocol::Tcp, 20);
        let all = [pseudo.as_slice(), segment.as_slice()].concat();
        assert_eq!(0, internet_checksum(&all));
    }

    #[test]
    fn test_ipv4_pseudo_header() {
        let pseudo = ipv4_pseudo_header(
            Ipv4Addr::new(10, 0, 0, 103),
            Ipv4Addr::new(10, 0, 0, 1),
            IpProtocol::Tcp,
            20,
        );
        assert_eq!(hex!("0a 00 00 67 0a 00 00 01 00 06 00 14"), pseudo);
    }
}
