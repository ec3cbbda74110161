// ============================================================================
// ANCIENS HASH WORDPRESS (comptes migrés)
// ============================================================================
//
// Formats supportés:
//   - phpass "portable": $P$<cost><salt 8 chars><22 chars>  (MD5 itéré)
//   - MD5 hex brut (32 caractères), très anciens comptes WordPress
//
// Ce module est isolé: pour retirer le support legacy il suffit d'enlever
// LegacyWordpressScheme de PasswordVerifier::with_default_schemes().
//
// ============================================================================

use super::password::HashScheme;

const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const SETTING_LENGTH: usize = 12;
const HASH_LENGTH: usize = 34;

pub struct LegacyWordpressScheme;

impl HashScheme for LegacyWordpressScheme {
    fn name(&self) -> &'static str {
        "wordpress-legacy"
    }

    fn verify(&self, plain: &str, stored: &str) -> bool {
        if stored.len() == 32 && stored.chars().all(|c| c.is_ascii_hexdigit()) {
            let digest = format!("{:x}", md5::compute(plain.as_bytes()));
            return digest.eq_ignore_ascii_case(stored);
        }

        match portable_hash(plain, stored) {
            Some(computed) => computed == stored,
            None => false,
        }
    }
}

/// Calcule le hash phpass portable pour `plain` avec le setting (12 premiers chars) de `stored`.
/// Retourne None si le setting n'est pas un setting phpass valide.
pub fn portable_hash(plain: &str, stored: &str) -> Option<String> {
    if stored.len() < SETTING_LENGTH || !stored.is_ascii() {
        return None;
    }
    let setting = &stored[..SETTING_LENGTH];
    if !setting.starts_with("$P$") && !setting.starts_with("$H$") {
        return None;
    }

    let count_log2 = ITOA64.iter().position(|&c| c == setting.as_bytes()[3])?;
    if !(7..=30).contains(&count_log2) {
        return None;
    }
    let count = 1u32 << count_log2;
    let salt = &setting[4..];

    let mut hash = md5::compute([salt.as_bytes(), plain.as_bytes()].concat()).0;
    for _ in 0..count {
        hash = md5::compute([&hash[..], plain.as_bytes()].concat()).0;
    }

    let mut output = String::with_capacity(HASH_LENGTH);
    output.push_str(setting);
    output.push_str(&encode64(&hash));
    Some(output)
}

/// Encodage base64 maison de phpass (ordre des bits différent du base64 standard)
fn encode64(input: &[u8]) -> String {
    let count = input.len();
    let mut output = String::new();
    let mut i = 0;

    loop {
        let mut value = input[i] as u32;
        i += 1;
        output.push(ITOA64[(value & 0x3f) as usize] as char);
        if i < count {
            value |= (input[i] as u32) << 8;
        }
        output.push(ITOA64[((value >> 6) & 0x3f) as usize] as char);
        if i >= count {
            break;
        }
        i += 1;
        if i < count {
            value |= (input[i] as u32) << 16;
        }
        output.push(ITOA64[((value >> 12) & 0x3f) as usize] as char);
        if i >= count {
            break;
        }
        i += 1;
        output.push(ITOA64[((value >> 18) & 0x3f) as usize] as char);
        if i >= count {
            break;
        }
    }

    output
}
