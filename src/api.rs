use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_SIZE};
use crate::error::HorcruxError;
use crate::fragment::{self, Fragment, GroupDescriptor, GROUP_ID_SIZE};
use crate::shamir;

/// File extension for persisted fragments.
pub const HORCRUX_EXT: &str = "horcrux";

/// Validated parameters for a split operation.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Total number of horcruxes to create (N).
    pub total: u8,
    /// Minimum number needed to reconstruct (K).
    pub threshold: u8,
    /// Directory for the horcrux files; defaults to the input's directory.
    pub output_dir: Option<PathBuf>,
}

/// Validated parameters for a bind operation.
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    /// Output path; defaults to the original file name from the group
    /// descriptor, in the current directory.
    pub output: Option<PathBuf>,
    /// Overwrite an existing output file.
    pub overwrite: bool,
}

/// Split a file into N encrypted horcruxes, any K of which reconstruct it.
///
/// The plaintext is encrypted once with a fresh AES-256 key; only the key is
/// Shamir-split. Every horcrux carries the full ciphertext, so any K files
/// are sufficient on their own. Writing is all-or-nothing: if any horcrux
/// fails to write, the ones already written for this group are removed
/// before the error is returned.
pub fn split(file: &Path, opts: &SplitOptions) -> Result<Vec<PathBuf>, HorcruxError> {
    let total = opts.total as usize;
    let threshold = opts.threshold as usize;
    if threshold < 2 || threshold > total {
        return Err(HorcruxError::InvalidParameters { total, threshold });
    }

    let plaintext = fs::read(file).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HorcruxError::FileNotFound(file.to_path_buf()),
        _ => HorcruxError::Io {
            path: file.to_path_buf(),
            source: e,
        },
    })?;

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| HorcruxError::FileNotFound(file.to_path_buf()))?;

    let key = Zeroizing::new(crypto::generate_key());
    let (nonce, ciphertext) = crypto::encrypt(&plaintext, &key)?;
    let content_checksum = *blake3::hash(&plaintext).as_bytes();

    let shares = shamir::split(key.as_slice(), total, threshold, None)?;

    let mut group_id = [0u8; GROUP_ID_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut group_id);

    let descriptor = GroupDescriptor {
        group_id,
        total: opts.total,
        threshold: opts.threshold,
        file_name,
        file_size: plaintext.len() as u64,
        content_checksum,
    };

    let output_dir = match &opts.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| HorcruxError::WriteFailure {
                path: dir.clone(),
                source: e,
            })?;
            dir.clone()
        }
        None => file.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());

    let mut written = Vec::with_capacity(total);
    for share in shares {
        let fragment = Fragment {
            descriptor: descriptor.clone(),
            share,
            nonce,
            ciphertext: ciphertext.clone(),
        };
        let path = output_dir.join(format!(
            "{stem}_{}_of_{}.{HORCRUX_EXT}",
            fragment.share.id, opts.total
        ));

        if let Err(e) = fs::write(&path, fragment::encode(&fragment)) {
            // A group must never exist half-written
            for partial in &written {
                let _ = fs::remove_file(partial);
            }
            return Err(HorcruxError::WriteFailure { path, source: e });
        }
        written.push(path);
    }

    Ok(written)
}

/// Reconstruct the original file from a set of horcrux files.
///
/// Nothing is written until both the AEAD tag and the plaintext checksum
/// have verified. Returns the path of the reconstructed file.
pub fn bind(paths: &[PathBuf], opts: &BindOptions) -> Result<PathBuf, HorcruxError> {
    let mut fragments = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HorcruxError::FileNotFound(path.clone()),
            _ => HorcruxError::Io {
                path: path.clone(),
                source: e,
            },
        })?;
        let fragment = fragment::decode(&bytes).map_err(|e| match e {
            HorcruxError::CorruptFragment(reason) => {
                HorcruxError::CorruptFragment(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        fragments.push(fragment);
    }

    let group = select_group(fragments)?;
    let descriptor = group[0].descriptor.clone();
    check_consistency(&group)?;

    // Deterministic choice: the K lowest share indices
    let mut shares: Vec<_> = group.iter().map(|f| f.share.clone()).collect();
    shares.sort_by_key(|s| s.id);
    shares.truncate(descriptor.threshold as usize);

    let key = Zeroizing::new(shamir::combine(&shares)?);
    let key: &[u8; KEY_SIZE] = key
        .as_slice()
        .try_into()
        .map_err(|_| HorcruxError::Cipher("reconstructed key has wrong length".into()))?;

    let plaintext = crypto::decrypt(&group[0].nonce, &group[0].ciphertext, key)?;

    // Second, independent integrity signal beyond the AEAD tag
    if blake3::hash(&plaintext).as_bytes() != &descriptor.content_checksum {
        return Err(HorcruxError::ChecksumMismatch);
    }

    let output = resolve_output(&descriptor, opts.output.as_deref());
    if output.exists() && !opts.overwrite {
        return Err(HorcruxError::FileExists(output));
    }

    fs::write(&output, &plaintext).map_err(|e| HorcruxError::WriteFailure {
        path: output.clone(),
        source: e,
    })?;

    Ok(output)
}

/// Group fragments by group id and pick the one that meets its own declared
/// threshold, preferring the group with the most fragments.
fn select_group(fragments: Vec<Fragment>) -> Result<Vec<Fragment>, HorcruxError> {
    let mut groups: HashMap<[u8; GROUP_ID_SIZE], Vec<Fragment>> = HashMap::new();
    for fragment in fragments {
        groups
            .entry(fragment.descriptor.group_id)
            .or_default()
            .push(fragment);
    }

    let group_count = groups.len();
    let mut best: Option<Vec<Fragment>> = None;
    for (_, group) in groups.iter() {
        if group.len() >= group[0].descriptor.threshold as usize {
            let better = match &best {
                Some(current) => {
                    (group.len(), group[0].descriptor.group_id)
                        > (current.len(), current[0].descriptor.group_id)
                }
                None => true,
            };
            if better {
                best = Some(group.clone());
            }
        }
    }

    if let Some(group) = best {
        return Ok(group);
    }

    // No group reaches its threshold. A mixed pile is a consistency problem;
    // a single short group just needs more horcruxes.
    if group_count > 1 {
        return Err(HorcruxError::InconsistentFragments(format!(
            "supplied horcruxes belong to {group_count} different groups and none has enough"
        )));
    }
    match groups.into_values().next() {
        Some(group) => Err(HorcruxError::InsufficientShares {
            group: group[0].descriptor.group_hex(),
            found: group.len(),
            required: group[0].descriptor.threshold as usize,
        }),
        None => Err(HorcruxError::InsufficientShares {
            group: "none".to_string(),
            found: 0,
            required: 2,
        }),
    }
}

/// Every fragment in a group must agree on the descriptor, nonce and
/// ciphertext, and carry a distinct non-zero share index.
fn check_consistency(group: &[Fragment]) -> Result<(), HorcruxError> {
    let first = &group[0];
    let group_hex = first.descriptor.group_hex();
    let mut seen = std::collections::HashSet::new();

    for fragment in group {
        if fragment.descriptor != first.descriptor {
            return Err(HorcruxError::InconsistentFragments(format!(
                "metadata mismatch within group {group_hex}"
            )));
        }
        if fragment.nonce != first.nonce || fragment.ciphertext != first.ciphertext {
            return Err(HorcruxError::InconsistentFragments(format!(
                "ciphertext mismatch within group {group_hex}"
            )));
        }
        if fragment.share.id == 0 || !seen.insert(fragment.share.id) {
            return Err(HorcruxError::InconsistentFragments(format!(
                "duplicate or invalid share index in group {group_hex}"
            )));
        }
    }

    Ok(())
}

fn resolve_output(descriptor: &GroupDescriptor, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_dir() => path.join(&descriptor.file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&descriptor.file_name),
    }
}
