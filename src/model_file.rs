//! `.nll` model files.
//!
//! A model file starts with a packed little-endian binary header and layer
//! table, followed by one ASCII record per link:
//!
//! ```text
//! u32 magic = 0x20041022 | u16 version = 1 | u32 num_layers | u32 num_links
//! num_layers x { u32 name_len | name bytes | u32 shape_len | u64 dims[shape_len] }
//! num_links  x "[Link:src=<name>,tgt=<name>,activation=<id>]\n"
//!              "Type=Dense\n"
//!              "Synapses=\n"
//!              "<fromIdx>,<toIdx>,<weight>,<bias>\n" per synapse
//!              "EndSynapses\n"
//!              "\n"
//! ```
//!
//! Floats are written in Rust's shortest round-trip form, so reading a file
//! back reproduces every weight and bias exactly.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{NetworkError, Result};
use crate::graph::{INPUT_LAYER, Link, LinkKind, Network, OUTPUT_LAYER, Synapse};
use crate::layers::{Activation, Layer};

/// File magic number.
pub const MAGIC: u32 = 0x2004_1022;

/// Current format version.
pub const VERSION: u16 = 1;

/// Extension appended to model paths that lack it.
pub const FILE_EXTENSION: &str = "nll";

/// Fixed-size header at the start of every model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u16,
    pub num_layers: u32,
    pub num_links: u32,
}

impl FileHeader {
    /// Encoded size in bytes; there is no padding.
    pub const SIZE: usize = 4 + 2 + 4 + 4;

    pub fn new(num_layers: u32, num_links: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            num_layers,
            num_links,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out[6..10].copy_from_slice(&self.num_layers.to_le_bytes());
        out[10..14].copy_from_slice(&self.num_links.to_le_bytes());
        out
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let header = Self {
            magic: reader.u32("magic")?,
            version: reader.u16("version")?,
            num_layers: reader.u32("layer count")?,
            num_links: reader.u32("link count")?,
        };
        if header.magic != MAGIC {
            return Err(NetworkError::format(format!(
                "bad magic 0x{:08x}, expected 0x{:08x}",
                header.magic, MAGIC
            )));
        }
        if header.version != VERSION {
            return Err(NetworkError::format(format!(
                "unsupported version {}, expected {}",
                header.version, VERSION
            )));
        }
        Ok(header)
    }
}

/// Returns `path` with the `.nll` suffix appended unless it already has it.
///
/// An existing different extension is kept: `model.bin` becomes `model.bin.nll`.
pub fn model_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(FILE_EXTENSION);
    PathBuf::from(name)
}

/// Writes `network` to `path` (suffix appended if missing).
///
/// The file is removed again if writing fails part way, so a failed save
/// never leaves a truncated model behind.
pub fn save_model(network: &Network, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = model_path(path);
    let bytes = encode(network)?;

    let mut file = File::create(&path).map_err(|e| NetworkError::io(&path, e))?;
    if let Err(source) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
        drop(file);
        if fs::remove_file(&path).is_ok() {
            log::warn!("Removed partially written model {}", path.display());
        }
        return Err(NetworkError::io(path, source));
    }

    log::info!(
        "Model saved to {} ({} layers, {} links, {} bytes)",
        path.display(),
        network.layer_count(),
        network.link_count(),
        bytes.len()
    );
    Ok(path)
}

/// Reads a network from `path` (suffix appended if missing).
pub fn load_model(path: impl AsRef<Path>) -> Result<Network> {
    let path = model_path(path);
    let bytes = fs::read(&path).map_err(|e| NetworkError::io(&path, e))?;
    let network = decode(&bytes)?;
    log::info!(
        "Model loaded from {} ({} layers, {} links)",
        path.display(),
        network.layer_count(),
        network.link_count()
    );
    Ok(network)
}

/// Serializes a network into model-file bytes.
pub fn encode(network: &Network) -> Result<Vec<u8>> {
    let num_layers = count_u32(network.layer_count(), "layers")?;
    let num_links = count_u32(network.link_count(), "links")?;

    let mut out = Vec::new();
    out.extend_from_slice(&FileHeader::new(num_layers, num_links).to_bytes());

    for (name, _, layer) in network.layers() {
        out.extend_from_slice(&count_u32(name.len(), "name bytes")?.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&count_u32(layer.rank(), "dimensions")?.to_le_bytes());
        for &dim in layer.shape() {
            out.extend_from_slice(&(dim as u64).to_le_bytes());
        }
    }

    for link in network.links() {
        out.extend_from_slice(link_record(network, link)?.as_bytes());
    }

    Ok(out)
}

fn count_u32(count: usize, what: &str) -> Result<u32> {
    u32::try_from(count)
        .map_err(|_| NetworkError::format(format!("too many {} for the format: {}", what, count)))
}

fn link_record(network: &Network, link: &Link) -> Result<String> {
    let name_of = |role: &'static str, layer| {
        network
            .layer_name(layer)
            .ok_or(NetworkError::UnregisteredLayer { role, layer })
    };
    let src = name_of("source", link.source())?;
    let tgt = name_of("target", link.target())?;

    let mut record = format!(
        "[Link:src={},tgt={},activation={}]\nType={}\nSynapses=\n",
        src,
        tgt,
        link.activate(),
        link.kind().type_name()
    );
    for syn in link.synapses() {
        record.push_str(&format!(
            "{},{},{},{}\n",
            syn.from_idx(),
            syn.to_idx(),
            syn.weight,
            syn.bias
        ));
    }
    record.push_str("EndSynapses\n\n");
    Ok(record)
}

/// Parses model-file bytes back into a network.
pub fn decode(bytes: &[u8]) -> Result<Network> {
    let mut reader = ByteReader::new(bytes);
    let header = FileHeader::read(&mut reader)?;

    let mut layers = Vec::new();
    for _ in 0..header.num_layers {
        layers.push(read_layer(&mut reader)?);
    }
    let mut network = assemble_layers(layers)?;

    let text = std::str::from_utf8(reader.rest())
        .map_err(|e| NetworkError::format(format!("link records are not valid UTF-8: {}", e)))?;
    let mut lines = LineReader::new(text);
    for _ in 0..header.num_links {
        let link = read_link(&mut lines, &network)?;
        network.add_link(link)?;
    }
    lines.finish()?;

    Ok(network)
}

fn read_layer(reader: &mut ByteReader<'_>) -> Result<(String, Layer)> {
    let name_len = reader.u32("layer name length")? as usize;
    let name = std::str::from_utf8(reader.take(name_len, "layer name")?)
        .map_err(|e| NetworkError::format(format!("layer name is not valid UTF-8: {}", e)))?
        .to_string();

    let rank = reader.u32("layer rank")? as usize;
    let mut shape = Vec::with_capacity(rank.min(reader.remaining() / 8));
    for _ in 0..rank {
        let dim = reader.u64("layer dimension")?;
        let dim = usize::try_from(dim).map_err(|_| {
            NetworkError::format(format!("layer '{}' dimension {} does not fit in memory", name, dim))
        })?;
        shape.push(dim);
    }

    Ok((name, Layer::new(shape)?))
}

/// Places the reserved layers first, then the rest in file order.
fn assemble_layers(mut layers: Vec<(String, Layer)>) -> Result<Network> {
    let mut take = |reserved: &str| -> Result<Layer> {
        let pos = layers
            .iter()
            .position(|(name, _)| name == reserved)
            .ok_or_else(|| NetworkError::format(format!("missing reserved layer '{}'", reserved)))?;
        Ok(layers.remove(pos).1)
    };
    let input = take(INPUT_LAYER)?;
    let output = take(OUTPUT_LAYER)?;

    let mut network = Network::new(input, output);
    for (name, layer) in layers {
        network.add_layer(name, layer)?;
    }
    Ok(network)
}

fn read_link(lines: &mut LineReader<'_>, network: &Network) -> Result<Link> {
    let (line_no, header) = lines.next("link header")?;
    let fields = header
        .strip_prefix("[Link:")
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| lines.error(line_no, "expected '[Link:src=..,tgt=..,activation=..]'"))?;

    let mut parts = fields.split(',');
    let mut field = |key: &str| {
        parts
            .next()
            .and_then(|part| part.strip_prefix(key))
            .and_then(|part| part.strip_prefix('='))
            .ok_or_else(|| lines.error(line_no, &format!("missing '{}=' in link header", key)))
    };
    let src = field("src")?;
    let tgt = field("tgt")?;
    let activation = field("activation")?;
    if parts.next().is_some() {
        return Err(lines.error(line_no, "unexpected field in link header"));
    }
    let activation = Activation::from_name(activation)?;

    let endpoint = |name: &str| -> Result<(usize, usize)> {
        let id = network.registry().find_value(name).ok_or_else(|| {
            lines.error(line_no, &format!("link references unknown layer '{}'", name))
        })?;
        let size = network.layer(id).map(Layer::size).unwrap_or(0);
        Ok((id, size))
    };
    let source = endpoint(src)?;
    let target = endpoint(tgt)?;

    let (line_no, type_line) = lines.next("link type")?;
    let kind = type_line
        .strip_prefix("Type=")
        .and_then(LinkKind::from_type_name)
        .ok_or_else(|| lines.error(line_no, &format!("unknown link type line {:?}", type_line)))?;

    lines.expect("Synapses=")?;
    let capacity = kind
        .synapse_count(source.1, target.1)
        .unwrap_or(0)
        .min(lines.remaining_bytes() / MIN_SYNAPSE_LINE);
    let mut synapses = Vec::with_capacity(capacity);
    loop {
        let (line_no, line) = lines.next("synapse or 'EndSynapses'")?;
        if line == "EndSynapses" {
            break;
        }
        synapses.push(parse_synapse(line).ok_or_else(|| {
            lines.error(line_no, &format!("invalid synapse line {:?}", line))
        })?);
    }
    lines.expect("")?;

    Link::from_synapses(kind, source, target, activation, synapses)
}

fn parse_synapse(line: &str) -> Option<Synapse> {
    let mut parts = line.split(',');
    let from_idx = parts.next()?.parse().ok()?;
    let to_idx = parts.next()?.parse().ok()?;
    let weight = parts.next()?.parse().ok()?;
    let bias = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Synapse::with_params(from_idx, to_idx, weight, bias))
}

/// Shortest possible synapse line: `"0,0,0,0\n"`.
const MIN_SYNAPSE_LINE: usize = 8;

/// Little-endian cursor over the binary part of a model file.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(NetworkError::format(format!(
                "unexpected end of file reading {} at offset {} (need {} bytes, {} left)",
                what,
                self.pos,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Line cursor over the text part of a model file. Line numbers are 1-based
/// and count from the start of the text section.
struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::SplitTerminator<'a, char>>,
    remaining: usize,
}

impl<'a> LineReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_terminator('\n').enumerate(),
            remaining: text.len(),
        }
    }

    fn next(&mut self, what: &str) -> Result<(usize, &'a str)> {
        let (idx, line) = self.lines.next().ok_or_else(|| {
            NetworkError::format(format!("unexpected end of file, expected {}", what))
        })?;
        self.remaining = self.remaining.saturating_sub(line.len() + 1);
        Ok((idx + 1, line))
    }

    /// Bytes of text not yet consumed.
    fn remaining_bytes(&self) -> usize {
        self.remaining
    }

    fn expect(&mut self, wanted: &str) -> Result<()> {
        let (line_no, line) = self.next(&format!("{:?}", wanted))?;
        if line != wanted {
            return Err(self.error(line_no, &format!("expected {:?}, found {:?}", wanted, line)));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        match self.lines.next() {
            Some((idx, line)) => Err(self.error(
                idx + 1,
                &format!("trailing data after last link: {:?}", line),
            )),
            None => Ok(()),
        }
    }

    fn error(&self, line_no: usize, message: &str) -> NetworkError {
        NetworkError::format(format!("link records line {}: {}", line_no, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::graph::DenseLinkConfig;

    fn sample_network() -> Network {
        let mut net = Network::new(Layer::new([2]).unwrap(), Layer::new([1]).unwrap());
        let hidden = net.add_layer("hid", Layer::new([1, 2]).unwrap()).unwrap();

        let mut a = DenseLinkConfig::new(net.input_id(), hidden)
            .with_activation(Activation::Sigmoid)
            .init(&net)
            .unwrap();
        for (i, syn) in a.synapses_mut().iter_mut().enumerate() {
            syn.weight = i as f64 * 0.5;
            syn.bias = -0.25;
        }
        let mut b = DenseLinkConfig::new(hidden, net.output_id()).init(&net).unwrap();
        b.value_init_synapses(1.0);
        net.add_link(a).unwrap();
        net.add_link(b).unwrap();
        net
    }

    #[test]
    fn test_header_layout() {
        let bytes = FileHeader::new(3, 2).to_bytes();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[0..4], &[0x22, 0x10, 0x04, 0x20]);
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(&bytes[6..10], &[3, 0, 0, 0]);
        assert_eq!(&bytes[10..14], &[2, 0, 0, 0]);
    }

    #[test]
    fn test_encode_layer_table() {
        let net = Network::new(Layer::new([2, 3]).unwrap(), Layer::new([1]).unwrap());
        let bytes = encode(&net).unwrap();

        let mut expected = FileHeader::new(2, 0).to_bytes().to_vec();
        expected.extend_from_slice(&10u32.to_le_bytes());
        expected.extend_from_slice(b"inputLayer");
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(&3u64.to_le_bytes());
        expected.extend_from_slice(&11u32.to_le_bytes());
        expected.extend_from_slice(b"outputLayer");
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(&1u64.to_le_bytes());

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_link_records() {
        let net = sample_network();
        let bytes = encode(&net).unwrap();
        let text = std::str::from_utf8(&bytes[bytes.len() - text_len(&net)..]).unwrap();

        let expected = "[Link:src=inputLayer,tgt=hid,activation=sigmoid]\n\
                        Type=Dense\n\
                        Synapses=\n\
                        0,0,0,-0.25\n\
                        0,1,0.5,-0.25\n\
                        1,0,1,-0.25\n\
                        1,1,1.5,-0.25\n\
                        EndSynapses\n\
                        \n\
                        [Link:src=hid,tgt=outputLayer,activation=linear]\n\
                        Type=Dense\n\
                        Synapses=\n\
                        0,0,1,1\n\
                        1,0,1,1\n\
                        EndSynapses\n\
                        \n";
        assert_eq!(text, expected);
    }

    fn text_len(net: &Network) -> usize {
        net.links()
            .iter()
            .map(|link| link_record(net, link).unwrap().len())
            .sum()
    }

    #[test]
    fn test_decode_roundtrip() {
        let net = sample_network();
        let decoded = decode(&encode(&net).unwrap()).unwrap();

        let names: Vec<_> = decoded.layers().map(|(name, _, l)| (name, l.shape())).collect();
        assert_eq!(
            names,
            vec![
                ("inputLayer", &[2usize][..]),
                ("outputLayer", &[1][..]),
                ("hid", &[1, 2][..]),
            ]
        );
        assert_eq!(decoded.link_count(), 2);
        for (a, b) in net.links().iter().zip(decoded.links()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = encode(&sample_network()).unwrap();
        bytes[0] ^= 0xff;
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = encode(&sample_network()).unwrap();
        bytes[4] = 2;
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("version 2"));
    }

    #[test]
    fn test_decode_rejects_truncated_file() {
        let bytes = encode(&sample_network()).unwrap();
        for cut in [3, FileHeader::SIZE + 2, FileHeader::SIZE + 20, bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "cut at {}", cut);
        }
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let mut bytes = encode(&sample_network()).unwrap();
        bytes.extend_from_slice(b"extra\n");
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("trailing data"));
    }

    #[test]
    fn test_decode_rejects_missing_reserved_layer() {
        let mut bytes = FileHeader::new(1, 0).to_bytes().to_vec();
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(b"inputLayer");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&4u64.to_le_bytes());

        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("outputLayer"));
    }

    #[test]
    fn test_decode_rejects_unknown_activation() {
        let mut bytes = encode(&sample_network()).unwrap();
        let needle = b"activation=linear";
        let pos = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        bytes[pos + 11..pos + 17].copy_from_slice(b"tanhxx");
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownActivation { ref name } if name == "tanhxx"));
    }

    fn raw_file(shapes: &[(&str, &[u64])], links: &str, num_links: u32) -> Vec<u8> {
        let mut bytes = FileHeader::new(shapes.len() as u32, num_links).to_bytes().to_vec();
        for (name, dims) in shapes {
            bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
            bytes.extend_from_slice(name.as_bytes());
            bytes.extend_from_slice(&(dims.len() as u32).to_le_bytes());
            for dim in *dims {
                bytes.extend_from_slice(&dim.to_le_bytes());
            }
        }
        bytes.extend_from_slice(links.as_bytes());
        bytes
    }

    #[test]
    fn test_decode_rejects_overflowing_layer_shape() {
        let big: &[u64] = &[1 << 40, 1 << 40];
        let one: &[u64] = &[1];
        let bytes = raw_file(&[("inputLayer", big), ("outputLayer", one)], "", 0);

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, NetworkError::SizeOverflow { .. }));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_decode_rejects_oversized_link_without_allocating() {
        let big: &[u64] = &[1 << 33];
        let links = "[Link:src=inputLayer,tgt=outputLayer,activation=linear]\n\
                     Type=Dense\n\
                     Synapses=\n\
                     EndSynapses\n\
                     \n";
        let bytes = raw_file(&[("inputLayer", big), ("outputLayer", big)], links, 1);

        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("found 0"));
    }

    #[test]
    fn test_decode_rejects_short_synapse_list() {
        let links = "[Link:src=inputLayer,tgt=outputLayer,activation=linear]\n\
                     Type=Dense\n\
                     Synapses=\n\
                     0,0,1,0\n\
                     EndSynapses\n\
                     \n";
        let (two, one): (&[u64], &[u64]) = (&[2], &[1]);
        let bytes = raw_file(&[("inputLayer", two), ("outputLayer", one)], links, 1);

        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("expects 2 synapses, found 1"));
    }

    #[test]
    fn test_parse_synapse_line() {
        let syn = parse_synapse("3,1,-0.5,2").unwrap();
        assert_eq!(syn.endpoints(), (3, 1));
        assert_eq!(syn.weight, -0.5);
        assert_eq!(syn.bias, 2.0);

        assert!(parse_synapse("3,1,-0.5").is_none());
        assert!(parse_synapse("3,1,-0.5,2,9").is_none());
        assert!(parse_synapse("a,1,0,0").is_none());
    }

    #[test]
    fn test_model_path_suffix() {
        assert_eq!(model_path("net"), PathBuf::from("net.nll"));
        assert_eq!(model_path("net.nll"), PathBuf::from("net.nll"));
        assert_eq!(model_path("dir/net.bin"), PathBuf::from("dir/net.bin.nll"));
    }
}
