// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Les tables sont mappées avec SeaORM.
//
// Liste des modules:
//   - users : Comptes (email ou provider social) + token de confirmation
//   - user_sessions : Refresh token actif (une ligne par utilisateur)
//   - people : Profil créé à l'inscription
//   - avatars : Les 10 slots d'avatars du profil
//   - social : Payloads Telegram / VK (pas une table)
//   - dto : Data Transfer Objects des routes /api/auth
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - people/avatars ne sont écrits qu'à la création du compte
//
// ============================================================================

pub mod avatars;
pub mod dto;
pub mod people;
pub mod social;
pub mod user_sessions;
pub mod users;
