use crate::value_objects::{Age, PasswordHash, PersonName, Timestamp, UserEmail, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: UserEmail,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub age: Age,
    pub password: PasswordHash,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    /// 实时通道在线标记
    pub online: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// 资料修改，`None` 表示保留原值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub age: Option<Age>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

impl User {
    pub fn register(
        id: UserId,
        email: UserEmail,
        first_name: PersonName,
        last_name: PersonName,
        age: Age,
        password: PasswordHash,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            email,
            first_name,
            last_name,
            age,
            password,
            bio: None,
            profile_pic: None,
            online: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: Timestamp) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio);
        }
        if let Some(profile_pic) = update.profile_pic {
            self.profile_pic = Some(profile_pic);
        }
        self.updated_at = now;
    }

    /// 名字中是否包含查询串（忽略大小写）
    pub fn name_matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.first_name.as_str().to_lowercase().contains(&query)
            || self.last_name.as_str().to_lowercase().contains(&query)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_pic: self.profile_pic.clone(),
            online: self.online,
        }
    }
}

/// 好友列表、会话参与者等场景使用的精简用户信息。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub profile_pic: Option<String>,
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user() -> User {
        User::register(
            UserId::generate(),
            UserEmail::parse("ada@example.com").unwrap(),
            PersonName::parse("first_name", "Ada").unwrap(),
            PersonName::parse("last_name", "Lovelace").unwrap(),
            Age::parse(36).unwrap(),
            PasswordHash::new("hash").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn profile_update_keeps_missing_fields() {
        let mut user = user();
        user.apply_profile(
            ProfileUpdate {
                bio: Some("mathematician".into()),
                ..Default::default()
            },
            Utc::now(),
        );

        assert_eq!(user.first_name.as_str(), "Ada");
        assert_eq!(user.age.value(), 36);
        assert_eq!(user.bio.as_deref(), Some("mathematician"));
    }

    #[test]
    fn name_search_is_case_insensitive() {
        let user = user();
        assert!(user.name_matches("love"));
        assert!(user.name_matches("ADA"));
        assert!(!user.name_matches("babbage"));
    }
}
