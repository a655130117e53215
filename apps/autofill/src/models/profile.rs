use serde::{Deserialize, Deserializer, Serialize};

/// A user's stored application data. Every scalar defaults to `""` and every
/// list to `[]`, whether the key is missing or explicitly `null`, so partially
/// filled records from older clients still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub personal_information: PersonalInformation,
    #[serde(deserialize_with = "null_as_default")]
    pub resume: ResumeSection,
    #[serde(deserialize_with = "null_as_default")]
    pub cover_letter: CoverLetter,
    #[serde(deserialize_with = "null_as_default")]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInformation {
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub linkedin: String,
    #[serde(deserialize_with = "null_as_default")]
    pub github: String,
    #[serde(deserialize_with = "null_as_default")]
    pub portfolio: String,
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeSection {
    #[serde(deserialize_with = "null_as_default")]
    pub objective: String,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub certifications: Vec<CertificationEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<ProjectEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub languages: Vec<LanguageEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub hobbies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(deserialize_with = "null_as_default")]
    pub field_of_study: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub language: String,
    #[serde(deserialize_with = "null_as_default")]
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverLetter {
    #[serde(deserialize_with = "null_as_default")]
    pub recipient: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub relationship: String,
}

impl ProfileRecord {
    /// Names of the contact fields a profile must carry before it can be saved.
    pub fn missing_contact_fields(&self) -> Vec<&'static str> {
        let info = &self.personal_information;
        [
            ("full_name", &info.full_name),
            ("email", &info.email),
            ("phone", &info.phone),
            ("location", &info.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect()
    }
}

/// Reads `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_record_fills_defaults() {
        let json = r#"{
            "personal_information": {"full_name": "Ada Lovelace"},
            "resume": {"skills": ["analysis"], "education": [{"institution": "Home"}]}
        }"#;
        let profile: ProfileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(profile.personal_information.full_name, "Ada Lovelace");
        assert_eq!(profile.personal_information.email, "");
        assert_eq!(profile.resume.skills, vec!["analysis"]);
        assert_eq!(profile.resume.education[0].degree, "");
        assert!(profile.resume.experience.is_empty());
        assert!(profile.references.is_empty());
        assert_eq!(profile.cover_letter, CoverLetter::default());
    }

    #[test]
    fn test_nulls_load_as_defaults() {
        let json = r#"{
            "personal_information": {"full_name": "Ada Lovelace", "email": null, "phone": null},
            "resume": {"skills": null, "education": [{"institution": "Home", "gpa": null}]},
            "cover_letter": null,
            "references": null
        }"#;
        let profile: ProfileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(profile.personal_information.full_name, "Ada Lovelace");
        assert_eq!(profile.personal_information.email, "");
        assert!(profile.resume.skills.is_empty());
        assert_eq!(profile.resume.education[0].gpa, "");
        assert_eq!(profile.cover_letter, CoverLetter::default());
        assert!(profile.references.is_empty());
    }

    #[test]
    fn test_empty_object_is_default_record() {
        let profile: ProfileRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, ProfileRecord::default());
    }

    #[test]
    fn test_missing_contact_fields() {
        let mut profile = ProfileRecord::default();
        profile.personal_information.full_name = "Ada Lovelace".to_string();
        profile.personal_information.phone = "   ".to_string();
        assert_eq!(
            profile.missing_contact_fields(),
            vec!["email", "phone", "location"]
        );
    }
}
