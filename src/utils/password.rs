use super::legacy_hash::LegacyWordpressScheme;

/// Coût bcrypt des nouveaux hash (même coût que les comptes existants)
pub const BCRYPT_COST: u32 = 10;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Un format de hash de mot de passe.
/// `verify` ne doit jamais paniquer: un hash illisible = pas de correspondance.
pub trait HashScheme: Send + Sync {
    fn name(&self) -> &'static str;
    fn verify(&self, plain: &str, stored: &str) -> bool;
}

pub struct BcryptScheme;

impl HashScheme for BcryptScheme {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn verify(&self, plain: &str, stored: &str) -> bool {
        // Err = le hash stocké n'est pas du bcrypt, on laisse le schéma suivant essayer
        bcrypt::verify(plain, stored).unwrap_or(false)
    }
}

/// Liste ordonnée de schémas, le premier qui reconnaît le mot de passe gagne
pub struct PasswordVerifier {
    schemes: Vec<Box<dyn HashScheme>>,
}

impl PasswordVerifier {
    pub fn new(schemes: Vec<Box<dyn HashScheme>>) -> Self {
        Self { schemes }
    }

    /// bcrypt d'abord, puis les anciens hash WordPress des comptes migrés
    pub fn with_default_schemes() -> Self {
        Self::new(vec![Box::new(BcryptScheme), Box::new(LegacyWordpressScheme)])
    }

    /// Nom du schéma qui valide le mot de passe, None si aucun
    pub fn matching_scheme(&self, plain: &str, stored: Option<&str>) -> Option<&'static str> {
        // Compte social pur: pas de hash, donc pas de connexion par mot de passe
        let stored = stored?;
        self.schemes
            .iter()
            .find(|scheme| scheme.verify(plain, stored))
            .map(|scheme| scheme.name())
    }

    pub fn verify(&self, plain: &str, stored: Option<&str>) -> bool {
        match self.matching_scheme(plain, stored) {
            Some(scheme) => {
                tracing::debug!(scheme, "Password matched");
                true
            }
            None => false,
        }
    }
}

/// Hash un mot de passe avec bcrypt (salt aléatoire inclus dans le hash)
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Au moins 6 caractères, une minuscule, une majuscule et un chiffre
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain uppercase and lowercase letters and digits".to_string(),
        );
    }

    Ok(())
}
