//! User-facing message catalogue.
//!
//! Indonesian is the product language; English is kept for integrators.

use std::borrow::Cow;

use crate::application::error::{AuthFailure, Conflict, Entity};
use crate::application::policy::Denial;
use crate::domain::validation::{Rule, Violation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Id,
    En,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" | "id-id" => Some(Locale::Id),
            "en" | "en-us" | "en-gb" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Id => "id",
            Locale::En => "en",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Listed(Entity),
    Fetched(Entity),
    Created(Entity),
    Updated(Entity),
    Deleted(Entity),
    ImageUploaded,
    FileUploaded,
    Registered,
    LoggedIn,
    LoggedOut,
    ProfileFetched,
    Liked,
    Unliked,
    NotFound(Entity),
    Forbidden(Denial),
    Unauthenticated(AuthFailure),
    Conflict(Conflict),
    ValidationFailed,
    MalformedRequest,
    PayloadTooLarge,
    ServiceUnavailable,
    ServerError,
    RouteNotFound,
}

fn noun(entity: Entity, locale: Locale) -> &'static str {
    match locale {
        Locale::Id => match entity {
            Entity::Forum => "Forum",
            Entity::Comment => "Komentar",
            Entity::Like => "Like",
            Entity::Job => "Lowongan",
            Entity::News => "Berita",
            Entity::Product => "Produk",
            Entity::Collaboration => "Kolaborasi",
            Entity::User => "User",
            Entity::Role => "Role",
            Entity::Province => "Provinsi",
            Entity::City => "Kota",
            Entity::Faculty => "Fakultas",
            Entity::Major => "Jurusan",
            Entity::JobField => "Bidang pekerjaan",
            Entity::CollaborationField => "Bidang kolaborasi",
        },
        Locale::En => match entity {
            Entity::Forum => "Forum",
            Entity::Comment => "Comment",
            Entity::Like => "Like",
            Entity::Job => "Job",
            Entity::News => "News",
            Entity::Product => "Product",
            Entity::Collaboration => "Collaboration",
            Entity::User => "User",
            Entity::Role => "Role",
            Entity::Province => "Province",
            Entity::City => "City",
            Entity::Faculty => "Faculty",
            Entity::Major => "Major",
            Entity::JobField => "Job field",
            Entity::CollaborationField => "Collaboration field",
        },
    }
}

pub fn render(message: Message, locale: Locale) -> Cow<'static, str> {
    use Message::*;
    let text: Cow<'static, str> = match (locale, message) {
        (Locale::Id, Listed(entity)) => {
            format!("Data {} berhasil diambil", noun(entity, locale).to_lowercase()).into()
        }
        (Locale::En, Listed(entity)) => {
            format!("{} data retrieved successfully", noun(entity, locale)).into()
        }
        (Locale::Id, Fetched(entity)) => {
            format!("Detail {} berhasil diambil", noun(entity, locale).to_lowercase()).into()
        }
        (Locale::En, Fetched(entity)) => {
            format!("{} retrieved successfully", noun(entity, locale)).into()
        }
        (Locale::Id, Created(entity)) => format!("{} berhasil dibuat", noun(entity, locale)).into(),
        (Locale::En, Created(entity)) => {
            format!("{} created successfully", noun(entity, locale)).into()
        }
        (Locale::Id, Updated(entity)) => {
            format!("{} berhasil diupdate", noun(entity, locale)).into()
        }
        (Locale::En, Updated(entity)) => {
            format!("{} updated successfully", noun(entity, locale)).into()
        }
        (Locale::Id, Deleted(entity)) => format!("{} berhasil dihapus", noun(entity, locale)).into(),
        (Locale::En, Deleted(entity)) => {
            format!("{} deleted successfully", noun(entity, locale)).into()
        }
        (Locale::Id, NotFound(entity)) => {
            format!("{} tidak ditemukan", noun(entity, locale)).into()
        }
        (Locale::En, NotFound(entity)) => format!("{} not found", noun(entity, locale)).into(),
        (Locale::Id, ImageUploaded) => "Gambar berhasil diupload".into(),
        (Locale::En, ImageUploaded) => "Image uploaded successfully".into(),
        (Locale::Id, FileUploaded) => "File berhasil diupload".into(),
        (Locale::En, FileUploaded) => "File uploaded successfully".into(),
        (Locale::Id, Registered) => "Registrasi berhasil".into(),
        (Locale::En, Registered) => "Registration successful".into(),
        (Locale::Id, LoggedIn) => "Login berhasil".into(),
        (Locale::En, LoggedIn) => "Login successful".into(),
        (Locale::Id, LoggedOut) => "Logout berhasil".into(),
        (Locale::En, LoggedOut) => "Logout successful".into(),
        (Locale::Id, ProfileFetched) => "Berhasil mengambil data user".into(),
        (Locale::En, ProfileFetched) => "User profile retrieved successfully".into(),
        (Locale::Id, Liked) => "Forum berhasil di-like".into(),
        (Locale::En, Liked) => "Forum liked".into(),
        (Locale::Id, Unliked) => "Forum berhasil di-unlike".into(),
        (Locale::En, Unliked) => "Forum unliked".into(),
        (Locale::Id, Forbidden(Denial::NotOwner)) => {
            "Anda tidak memiliki izin untuk melakukan aksi ini".into()
        }
        (Locale::En, Forbidden(Denial::NotOwner)) => {
            "You do not have permission to perform this action".into()
        }
        (Locale::Id, Forbidden(Denial::AdminOnly)) => {
            "Hanya admin yang dapat melakukan aksi ini".into()
        }
        (Locale::En, Forbidden(Denial::AdminOnly)) => {
            "Only administrators can perform this action".into()
        }
        (Locale::Id, Forbidden(Denial::ProtectedAccount)) => {
            "Tidak dapat menghapus user Admin".into()
        }
        (Locale::En, Forbidden(Denial::ProtectedAccount)) => {
            "Admin accounts cannot be deleted".into()
        }
        (Locale::Id, Unauthenticated(AuthFailure::MissingToken)) => {
            "Anda harus login terlebih dahulu".into()
        }
        (Locale::En, Unauthenticated(AuthFailure::MissingToken)) => "Unauthenticated.".into(),
        (Locale::Id, Unauthenticated(_)) => "Token tidak valid atau sudah kedaluwarsa".into(),
        (Locale::En, Unauthenticated(_)) => "Token is invalid or has expired".into(),
        (Locale::Id, Conflict(conflict)) => match conflict {
            self::Conflict::Email => "Email sudah terdaftar".into(),
            self::Conflict::Nim => "NIM sudah terdaftar".into(),
            self::Conflict::PhoneNumber => "Nomor telepon sudah terdaftar".into(),
            self::Conflict::Other => "Data sudah ada".into(),
        },
        (Locale::En, Conflict(conflict)) => match conflict {
            self::Conflict::Email => "Email is already registered".into(),
            self::Conflict::Nim => "NIM is already registered".into(),
            self::Conflict::PhoneNumber => "Phone number is already registered".into(),
            self::Conflict::Other => "Record already exists".into(),
        },
        (Locale::Id, ValidationFailed) => "Data yang diberikan tidak valid".into(),
        (Locale::En, ValidationFailed) => "The given data was invalid.".into(),
        (Locale::Id, MalformedRequest) => "Format permintaan tidak valid".into(),
        (Locale::En, MalformedRequest) => "Malformed request".into(),
        (Locale::Id, PayloadTooLarge) => "Ukuran permintaan terlalu besar".into(),
        (Locale::En, PayloadTooLarge) => "Request payload is too large".into(),
        (Locale::Id, ServiceUnavailable) => "Layanan sedang tidak tersedia".into(),
        (Locale::En, ServiceUnavailable) => "Service temporarily unavailable".into(),
        (Locale::Id, ServerError) => "Terjadi kesalahan pada server".into(),
        (Locale::En, ServerError) => "Internal server error".into(),
        (Locale::Id, RouteNotFound) => "Halaman tidak ditemukan".into(),
        (Locale::En, RouteNotFound) => "Route not found".into(),
    };
    text
}

/// Human label of a request field, falling back to the field name.
fn label(field: &str, locale: Locale) -> Cow<'static, str> {
    let known = match (locale, field) {
        (Locale::Id, "city_id") => Some("Kota"),
        (Locale::Id, "province_id") => Some("Provinsi"),
        (Locale::Id, "faculty_id") => Some("Fakultas"),
        (Locale::Id, "major_id") => Some("Jurusan"),
        (Locale::Id, "role_id") => Some("Role"),
        (Locale::Id, "job_field_id") => Some("Bidang pekerjaan"),
        (Locale::Id, "collaboration_field_id") => Some("Bidang kolaborasi"),
        (Locale::Id, "title") => Some("Judul"),
        (Locale::Id, "content") => Some("Konten"),
        (Locale::Id, "company") => Some("Perusahaan"),
        (Locale::Id, "name") => Some("Nama"),
        (Locale::Id, "description") => Some("Deskripsi"),
        (Locale::Id, "price") => Some("Harga"),
        (Locale::Id, "category") => Some("Kategori"),
        (Locale::Id, "phone_number") => Some("Nomor telepon"),
        (Locale::Id, "enrollment_year") => Some("Tahun masuk"),
        (Locale::Id, "graduation_year") => Some("Tahun lulus"),
        (Locale::Id, "open_from") => Some("Tanggal buka"),
        (Locale::Id, "open_until") => Some("Tanggal tutup"),
        (Locale::Id, "registration_link") => Some("Link pendaftaran"),
        (Locale::Id, "verification_file_url") => Some("File verifikasi"),
        (Locale::Id, "image") => Some("Gambar"),
        (Locale::Id, "file") => Some("File"),
        (Locale::Id, "nim") => Some("NIM"),
        (Locale::Id, "email") => Some("Email"),
        (Locale::Id, "password") => Some("Password"),
        (Locale::En, "city_id") => Some("city"),
        (Locale::En, "province_id") => Some("province"),
        (Locale::En, "faculty_id") => Some("faculty"),
        (Locale::En, "major_id") => Some("major"),
        (Locale::En, "role_id") => Some("role"),
        (Locale::En, "job_field_id") => Some("job field"),
        (Locale::En, "collaboration_field_id") => Some("collaboration field"),
        (Locale::En, "nim") => Some("NIM"),
        _ => None,
    };
    match known {
        Some(label) => Cow::Borrowed(label),
        None => Cow::Owned(field.replace('_', " ")),
    }
}

pub fn render_violation(violation: &Violation, locale: Locale) -> String {
    let field = label(violation.field, locale);
    match (locale, violation.rule) {
        (Locale::Id, Rule::Required) => format!("{field} wajib diisi"),
        (Locale::En, Rule::Required) => format!("The {field} field is required."),
        (Locale::Id, Rule::MinLength(min)) => format!("{field} minimal {min} karakter"),
        (Locale::En, Rule::MinLength(min)) => {
            format!("The {field} must be at least {min} characters.")
        }
        (Locale::Id, Rule::Email) => format!("Format {field} tidak valid"),
        (Locale::En, Rule::Email) => format!("The {field} must be a valid email address."),
        (Locale::Id, Rule::Url) => format!("{field} harus berupa URL yang valid"),
        (Locale::En, Rule::Url) => format!("The {field} must be a valid URL."),
        (Locale::Id, Rule::Invalid) => format!("{field} tidak valid"),
        (Locale::En, Rule::Invalid) => format!("The selected {field} is invalid."),
        (Locale::Id, Rule::After(other)) => {
            format!("{field} harus setelah {}", label(other, locale))
        }
        (Locale::En, Rule::After(other)) => {
            format!("The {field} must be after {}.", label(other, locale))
        }
        (Locale::Id, Rule::NotNegative) => format!("{field} tidak boleh negatif"),
        (Locale::En, Rule::NotNegative) => format!("The {field} must be at least 0."),
        (Locale::Id, Rule::Exists) => format!("{field} tidak ditemukan"),
        (Locale::En, Rule::Exists) => format!("The selected {field} does not exist."),
        (Locale::Id, Rule::Between(min, max)) => format!("{field} harus antara {min} dan {max}"),
        (Locale::En, Rule::Between(min, max)) => {
            format!("The {field} must be between {min} and {max}.")
        }
        (Locale::Id, Rule::CityProvinceMismatch) => {
            "Kota tidak sesuai dengan provinsi yang dipilih".to_string()
        }
        (Locale::En, Rule::CityProvinceMismatch) => {
            "The city does not belong to the selected province.".to_string()
        }
        (Locale::Id, Rule::DefaultRoleMissing) => {
            "Role default \"Alumni\" tidak ditemukan".to_string()
        }
        (Locale::En, Rule::DefaultRoleMissing) => {
            "Default role \"Alumni\" does not exist.".to_string()
        }
        (Locale::Id, Rule::InvalidCredentials) => "NIM atau password salah".to_string(),
        (Locale::En, Rule::InvalidCredentials) => "Invalid NIM or password.".to_string(),
        (Locale::Id, Rule::MaxKilobytes(kb)) => format!("Ukuran {field} maksimal {kb} KB"),
        (Locale::En, Rule::MaxKilobytes(kb)) => {
            format!("The {field} may not be greater than {kb} kilobytes.")
        }
        (Locale::Id, Rule::FileType(types)) => {
            format!("{field} harus berupa file bertipe: {types}")
        }
        (Locale::En, Rule::FileType(types)) => {
            format!("The {field} must be a file of type: {types}.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indonesian_wording() {
        assert_eq!(
            render(Message::NotFound(Entity::Job), Locale::Id),
            "Lowongan tidak ditemukan"
        );
        assert_eq!(
            render(Message::Listed(Entity::Forum), Locale::Id),
            "Data forum berhasil diambil"
        );
        assert_eq!(
            render(Message::Created(Entity::News), Locale::Id),
            "Berita berhasil dibuat"
        );
        assert_eq!(
            render(Message::Forbidden(Denial::AdminOnly), Locale::Id),
            "Hanya admin yang dapat melakukan aksi ini"
        );
    }

    #[test]
    fn violations_use_field_labels() {
        let missing_city = Violation {
            field: "city_id",
            rule: Rule::Exists,
        };
        assert_eq!(render_violation(&missing_city, Locale::Id), "Kota tidak ditemukan");

        let short = Violation {
            field: "title",
            rule: Rule::MinLength(3),
        };
        assert_eq!(
            render_violation(&short, Locale::En),
            "The title must be at least 3 characters."
        );
    }

    #[test]
    fn locale_parsing() {
        assert_eq!(Locale::parse("EN"), Some(Locale::En));
        assert_eq!(Locale::parse("id"), Some(Locale::Id));
        assert_eq!(Locale::parse("fr"), None);
    }
}
