//! Path and method table of the JSON API.
//!
//! # Invariants
//! - Paths are matched exactly, except that one trailing `/` is ignored.
//! - A known path with a foreign method is distinguishable from an unknown path.

use http::Method;

/// A user-owned collection exposed under `/api/{segment}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Educations,
    WorkExperiences,
    Languages,
    Topics,
    SocialMedias,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Educations,
        Resource::WorkExperiences,
        Resource::Languages,
        Resource::Topics,
        Resource::SocialMedias,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            Self::Educations => "educations",
            Self::WorkExperiences => "work-experiences",
            Self::Languages => "languages",
            Self::Topics => "topics",
            Self::SocialMedias => "social-medias",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.segment() == segment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    Register,
    Login,
    Logout,
    User,
    Profile,
    Collection(Resource),
    Item(Resource, String),
}

impl Route {
    /// Resolves a request path (without query string).
    pub fn match_path(path: &str) -> Option<Self> {
        let path = path.strip_suffix('/').unwrap_or(path);
        let rest = path.strip_prefix("/api/")?;
        let mut segments = rest.split('/');
        let head = segments.next()?;
        let id = segments.next();
        if segments.next().is_some() {
            return None;
        }

        match (head, id) {
            ("health", None) => Some(Self::Health),
            ("register", None) => Some(Self::Register),
            ("login", None) => Some(Self::Login),
            ("logout", None) => Some(Self::Logout),
            ("user", None) => Some(Self::User),
            ("profile", None) => Some(Self::Profile),
            (segment, None) => Resource::from_segment(segment).map(Self::Collection),
            (_, Some("")) => None,
            (segment, Some(id)) => {
                Resource::from_segment(segment).map(|resource| Self::Item(resource, id.to_string()))
            }
        }
    }

    /// Value of the `Allow` header for this route.
    pub fn allow_header(&self) -> &'static str {
        match self {
            Self::Health | Self::User => "GET",
            Self::Register | Self::Login | Self::Logout => "POST",
            Self::Profile => "GET, PATCH",
            Self::Collection(_) => "GET, POST",
            Self::Item(..) => "GET, PATCH, DELETE",
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.allow_header()
            .split(", ")
            .any(|allowed| allowed == method.as_str())
    }

    /// Whether the route needs a signed-in user.
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Self::Health | Self::Register | Self::Login | Self::Logout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Resource, Route};
    use http::Method;

    #[test]
    fn resource_paths_resolve() {
        assert_eq!(
            Route::match_path("/api/work-experiences"),
            Some(Route::Collection(Resource::WorkExperiences))
        );
        assert_eq!(
            Route::match_path("/api/social-medias/social_6/"),
            Some(Route::Item(Resource::SocialMedias, "social_6".to_string()))
        );
        assert_eq!(Route::match_path("/api/profile"), Some(Route::Profile));
    }

    #[test]
    fn unknown_or_deep_paths_do_not_resolve() {
        for path in [
            "/",
            "/api",
            "/api/",
            "/api/unknown",
            "/api/topics/1/extra",
            "/api/topics//",
            "/api/profile/1",
            "/health",
        ] {
            assert_eq!(Route::match_path(path), None, "{path}");
        }
    }

    #[test]
    fn methods_follow_the_table() {
        let item = Route::Item(Resource::Topics, "t".to_string());
        assert!(item.allows(&Method::DELETE));
        assert!(!item.allows(&Method::POST));
        assert!(!Route::Login.allows(&Method::GET));
        assert!(Route::Profile.allows(&Method::PATCH));
        assert!(!Route::Health.requires_session());
        assert!(item.requires_session());
    }
}
