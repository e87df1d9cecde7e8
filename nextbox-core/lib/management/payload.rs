//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The CRUD page written over the scaffolded `app/page.tsx`.
///
/// A client component that keeps a list of named items with descriptions in `localStorage`
/// and lets the user create, edit and delete them.
pub const WEB_APP_SOURCE: &str = include_str!("../../assets/page.tsx");
