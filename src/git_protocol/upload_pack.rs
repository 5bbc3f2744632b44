use super::{Error, PktLine, PktLines, Result};
use crate::hash::Sha1Hash;
use tracing::{debug, info};

const PACK_SIGNATURE: &[u8] = b"PACK";

const BAND_DATA: u8 = 1;
const BAND_PROGRESS: u8 = 2;
const BAND_ERROR: u8 = 3;

/// `want <hex> <capabilities>\n` as one pkt-line, a flush, then `done`.
pub fn request_body(want: &Sha1Hash, capabilities: &str) -> Vec<u8> {
    let want = if capabilities.is_empty() {
        format!("want {want}\n")
    } else {
        format!("want {want} {capabilities}\n")
    };

    [
        PktLine::new(want.into_bytes()).encode(),
        PktLine::flush().encode(),
        PktLine::new(b"done\n".to_vec()).encode(),
    ]
    .concat()
}

/// Pulls the pack stream out of an upload-pack response body.
///
/// Leading `NAK`/`ACK` lines are skipped. The pack then either follows
/// as raw bytes or arrives as side-band pkt-lines ending in a flush.
pub fn pack_data(body: &[u8]) -> Result<Vec<u8>> {
    let mut lines = PktLines::new(body);
    let mut pack: Vec<u8> = vec![];

    loop {
        if pack.is_empty() && lines.remaining().starts_with(PACK_SIGNATURE) {
            return Ok(lines.remaining().to_vec());
        }

        let data = match lines.next().transpose()? {
            None | Some(PktLine::Flush) => break,
            Some(PktLine::Data(data)) => data,
        };

        match data.split_first() {
            Some((&BAND_DATA, rest)) => pack.extend_from_slice(rest),
            Some((&BAND_PROGRESS, rest)) => {
                for progress in format_progress(rest) {
                    info!(target: "remote", "{progress}");
                }
            }
            Some((&BAND_ERROR, rest)) => {
                return Err(Error::Network(format!(
                    "remote error: {}",
                    String::from_utf8_lossy(rest).trim_end()
                )));
            }
            _ if is_ack(&data) => {
                debug!(line = %String::from_utf8_lossy(&data).trim_end(), "negotiation");
            }
            _ => {
                return Err(Error::Network(format!(
                    "unexpected pkt-line in upload-pack response: {:?}",
                    String::from_utf8_lossy(&data)
                )));
            }
        }
    }

    if !pack.starts_with(PACK_SIGNATURE) {
        return Err(Error::Network("upload-pack response carried no pack".into()));
    }
    Ok(pack)
}

fn is_ack(data: &[u8]) -> bool {
    data.starts_with(b"NAK") || data.starts_with(b"ACK ")
}

fn format_progress(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(id: u8, bytes: &[u8]) -> Vec<u8> {
        PktLine::new([&[id][..], bytes].concat()).encode()
    }

    #[test]
    fn it_builds_request_body() {
        let want = Sha1Hash::from([0xab; 20]);
        let body = request_body(&want, "side-band-64k ofs-delta");
        let line = format!("want {} side-band-64k ofs-delta\n", "ab".repeat(20));
        let expected = format!("{:04x}{line}00000009done\n", line.len() + 4);
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn it_builds_request_without_capabilities() {
        let want = Sha1Hash::from([0x01; 20]);
        let body = request_body(&want, "");
        assert!(body.starts_with(format!("0032want {}\n", "01".repeat(20)).as_bytes()));
    }

    #[test]
    fn it_takes_raw_pack_after_nak() {
        let body = b"0008NAK\nPACK\x00\x00\x00\x02\x00\x00\x00\x00rest";
        let pack = pack_data(body).unwrap();
        assert_eq!(pack, b"PACK\x00\x00\x00\x02\x00\x00\x00\x00rest");

        let body = b"PACKbytes";
        assert_eq!(pack_data(body).unwrap(), b"PACKbytes");
    }

    #[test]
    fn it_demultiplexes_side_band() {
        let body = [
            b"0008NAK\n".to_vec(),
            band(BAND_PROGRESS, b"Counting objects: 3, done.\r"),
            band(BAND_DATA, b"PACK\x00\x00"),
            band(BAND_PROGRESS, b"Total 3\n"),
            band(BAND_DATA, b"\x00\x02tail"),
            PktLine::flush().encode(),
        ]
        .concat();
        assert_eq!(pack_data(&body).unwrap(), b"PACK\x00\x00\x00\x02tail");
    }

    #[test]
    fn it_surfaces_remote_error() {
        let body = [b"0008NAK\n".to_vec(), band(BAND_ERROR, b"access denied\n")].concat();
        let err = pack_data(&body).unwrap_err();
        assert!(matches!(err, Error::Network(msg) if msg.contains("access denied")));
    }

    #[test]
    fn it_fails_without_pack() {
        assert!(matches!(pack_data(b"0008NAK\n0000"), Err(Error::Network(_))));
        assert!(matches!(pack_data(b""), Err(Error::Network(_))));
    }

    #[test]
    fn it_splits_progress_lines() {
        assert_eq!(
            format_progress(b"Receiving 10%\rReceiving 100%\n"),
            ["Receiving 10%", "Receiving 100%"]
        );
    }
}
