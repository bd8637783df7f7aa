// ABOUTME: Built-in provider descriptors: endpoints, parameter quirks, and
// ABOUTME: profile field mappings for the sources shipped out of the box
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::source::oauth1::Oauth1Source;
use crate::source::{
    AuthSource, DescriptorSource, GrantFlavor, IdentityQueryParam, ProfileMap, SourceSpec,
    TokenPlacement, TokenRequestStyle, TokenResponseFormat,
};
use std::sync::Arc;

pub const GITHUB: SourceSpec = SourceSpec {
    name: "github",
    authorize_url: "https://github.com/login/oauth/authorize",
    token_url: "https://github.com/login/oauth/access_token",
    profile_url: Some("https://api.github.com/user"),
    token_placement: TokenPlacement::HeaderPrefix("token"),
    profile: ProfileMap {
        uid: "/id",
        username: "/login",
        nickname: Some("/name"),
        avatar: Some("/avatar_url"),
        email: Some("/email"),
        remark: Some("/bio"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const GITEE: SourceSpec = SourceSpec {
    name: "gitee",
    authorize_url: "https://gitee.com/oauth/authorize",
    token_url: "https://gitee.com/oauth/token",
    profile_url: Some("https://gitee.com/api/v5/user"),
    refresh_url: Some("https://gitee.com/oauth/token"),
    scope_delimiter: ",",
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile: ProfileMap {
        uid: "/id",
        username: "/login",
        nickname: Some("/name"),
        avatar: Some("/avatar_url"),
        email: Some("/email"),
        remark: Some("/bio"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const GOOGLE: SourceSpec = SourceSpec {
    name: "google",
    authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    profile_url: Some("https://www.googleapis.com/oauth2/v3/userinfo"),
    default_scopes: &["openid", "profile", "email"],
    profile: ProfileMap {
        uid: "/sub",
        username: "/name",
        nickname: Some("/given_name"),
        avatar: Some("/picture"),
        email: Some("/email"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const FACEBOOK: SourceSpec = SourceSpec {
    name: "facebook",
    authorize_url: "https://www.facebook.com/v9.0/dialog/oauth",
    token_url: "https://graph.facebook.com/v9.0/oauth/access_token",
    profile_url: Some("https://graph.facebook.com/v9.0/me"),
    scope_delimiter: ",",
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile_extra_query: &[("fields", "id,name,email,picture")],
    profile: ProfileMap {
        uid: "/id",
        username: "/name",
        avatar: Some("/picture/data/url"),
        email: Some("/email"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const MICROSOFT: SourceSpec = SourceSpec {
    name: "microsoft",
    authorize_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
    token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
    profile_url: Some("https://graph.microsoft.com/v1.0/me"),
    refresh_url: Some("https://login.microsoftonline.com/common/oauth2/v2.0/token"),
    default_scopes: &["User.Read"],
    profile: ProfileMap {
        uid: "/id",
        username: "/userPrincipalName",
        nickname: Some("/displayName"),
        email: Some("/mail"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const LINKEDIN: SourceSpec = SourceSpec {
    name: "linkedin",
    authorize_url: "https://www.linkedin.com/oauth/v2/authorization",
    token_url: "https://www.linkedin.com/oauth/v2/accessToken",
    profile_url: Some("https://api.linkedin.com/v2/me"),
    refresh_url: Some("https://www.linkedin.com/oauth/v2/accessToken"),
    profile: ProfileMap {
        uid: "/id",
        username: "/localizedFirstName",
        nickname: Some("/localizedFirstName"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const SLACK: SourceSpec = SourceSpec {
    name: "slack",
    authorize_url: "https://slack.com/oauth/v2/authorize",
    token_url: "https://slack.com/api/oauth.v2.access",
    // users.identity works with the identity scopes and needs no user id
    // parameter, unlike users.info.
    profile_url: Some("https://slack.com/api/users.identity"),
    scope_delimiter: ",",
    profile: ProfileMap {
        uid: "/user/id",
        username: "/user/name",
        email: Some("/user/email"),
        error_key: Some("/error"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const AMAZON: SourceSpec = SourceSpec {
    name: "amazon",
    authorize_url: "https://www.amazon.com/ap/oa",
    token_url: "https://api.amazon.com/auth/o2/token",
    profile_url: Some("https://api.amazon.com/user/profile"),
    refresh_url: Some("https://api.amazon.com/auth/o2/token"),
    default_scopes: &["profile"],
    profile: ProfileMap {
        uid: "/user_id",
        username: "/name",
        email: Some("/email"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const LINE: SourceSpec = SourceSpec {
    name: "line",
    authorize_url: "https://access.line.me/oauth2/v2.1/authorize",
    token_url: "https://api.line.me/oauth2/v2.1/token",
    profile_url: Some("https://api.line.me/v2/profile"),
    refresh_url: Some("https://api.line.me/oauth2/v2.1/token"),
    default_scopes: &["profile"],
    profile: ProfileMap {
        uid: "/userId",
        username: "/displayName",
        nickname: Some("/displayName"),
        avatar: Some("/pictureUrl"),
        remark: Some("/statusMessage"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const WEIBO: SourceSpec = SourceSpec {
    name: "weibo",
    authorize_url: "https://api.weibo.com/oauth2/authorize",
    token_url: "https://api.weibo.com/oauth2/access_token",
    profile_url: Some("https://api.weibo.com/2/users/show.json"),
    revoke_url: Some("https://api.weibo.com/oauth2/revokeoauth2"),
    scope_delimiter: ",",
    token_error_key: Some("error_code"),
    token_error_detail_key: Some("error"),
    token_placement: TokenPlacement::QueryParam("access_token"),
    // users/show.json wants the uid the token response reported.
    profile_identity_param: IdentityQueryParam::Uid("uid"),
    profile: ProfileMap {
        uid: "/idstr",
        username: "/screen_name",
        nickname: Some("/screen_name"),
        avatar: Some("/profile_image_url"),
        remark: Some("/description"),
        gender: Some("/gender"),
        error_key: Some("/error_code"),
        error_detail_key: Some("/error"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const BAIDU: SourceSpec = SourceSpec {
    name: "baidu",
    authorize_url: "https://openapi.baidu.com/oauth/2.0/authorize",
    token_url: "https://openapi.baidu.com/oauth/2.0/token",
    profile_url: Some("https://openapi.baidu.com/rest/2.0/passport/users/getInfo"),
    refresh_url: Some("https://openapi.baidu.com/oauth/2.0/token"),
    revoke_url: Some("https://openapi.baidu.com/rest/2.0/passport/auth/revokeAuthorization"),
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile: ProfileMap {
        uid: "/userid",
        username: "/username",
        nickname: Some("/username"),
        avatar: Some("/portrait"),
        gender: Some("/sex"),
        error_key: Some("/error_code"),
        error_detail_key: Some("/error_msg"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const CODING: SourceSpec = SourceSpec {
    name: "coding",
    authorize_url: "https://coding.net/oauth_authorize.html",
    token_url: "https://coding.net/api/oauth/access_token",
    profile_url: Some("https://coding.net/api/current_user"),
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile: ProfileMap {
        uid: "/id",
        username: "/name",
        nickname: Some("/name"),
        avatar: Some("/avatar"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const OSCHINA: SourceSpec = SourceSpec {
    name: "oschina",
    authorize_url: "https://www.oschina.net/action/oauth2/authorize",
    token_url: "https://www.oschina.net/action/openapi/token",
    profile_url: Some("https://www.oschina.net/action/openapi/user"),
    scope_delimiter: ",",
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile_extra_query: &[("dataType", "json")],
    profile: ProfileMap {
        uid: "/id",
        username: "/name",
        nickname: Some("/name"),
        avatar: Some("/avatar"),
        email: Some("/email"),
        gender: Some("/gender"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const DOUYIN: SourceSpec = SourceSpec {
    name: "douyin",
    authorize_url: "https://open.douyin.com/platform/oauth/connect",
    token_url: "https://open.douyin.com/oauth/access_token/",
    profile_url: Some("https://open.douyin.com/oauth/userinfo/"),
    refresh_url: Some("https://open.douyin.com/oauth/refresh_token/"),
    client_id_param: "client_key",
    scope_delimiter: ",",
    default_scopes: &["user_info"],
    token_style: TokenRequestStyle::GetQuery,
    // Token fields arrive wrapped in a `data` object.
    token_root: Some("/data"),
    token_error_key: Some("error_code"),
    token_error_detail_key: Some("description"),
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile_identity_param: IdentityQueryParam::OpenId("open_id"),
    profile: ProfileMap {
        uid: "/data/open_id",
        username: "/data/nickname",
        nickname: Some("/data/nickname"),
        avatar: Some("/data/avatar"),
        gender: Some("/data/gender"),
        error_key: Some("/data/error_code"),
        error_detail_key: Some("/data/description"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const STACK_OVERFLOW: SourceSpec = SourceSpec {
    name: "stack_overflow",
    authorize_url: "https://stackoverflow.com/oauth",
    token_url: "https://stackoverflow.com/oauth/access_token",
    profile_url: Some("https://api.stackexchange.com/2.2/me"),
    scope_delimiter: ",",
    default_scopes: &["private_info"],
    // The token endpoint answers in form-encoded text, not JSON.
    token_format: TokenResponseFormat::FormEncoded,
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile_extra_query: &[("site", "stackoverflow")],
    profile: ProfileMap {
        uid: "/items/0/user_id",
        username: "/items/0/display_name",
        nickname: Some("/items/0/display_name"),
        avatar: Some("/items/0/profile_image"),
        error_key: Some("/error_id"),
        error_detail_key: Some("/error_message"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const WECHAT: SourceSpec = SourceSpec {
    name: "wechat",
    authorize_url: "https://open.weixin.qq.com/connect/oauth2/authorize",
    token_url: "https://api.weixin.qq.com/sns/oauth2/access_token",
    profile_url: Some("https://api.weixin.qq.com/sns/userinfo"),
    refresh_url: Some("https://api.weixin.qq.com/sns/oauth2/refresh_token"),
    client_id_param: "appid",
    client_secret_param: "secret",
    scope_delimiter: ",",
    default_scopes: &["snsapi_userinfo"],
    token_style: TokenRequestStyle::GetQuery,
    // Errors come back with HTTP 200 and an errcode body.
    token_error_key: Some("errcode"),
    token_error_detail_key: Some("errmsg"),
    token_placement: TokenPlacement::QueryParam("access_token"),
    profile_identity_param: IdentityQueryParam::OpenId("openid"),
    profile_extra_query: &[("lang", "zh_CN")],
    authorize_fragment: Some("#wechat_redirect"),
    profile: ProfileMap {
        uid: "/openid",
        username: "/nickname",
        nickname: Some("/nickname"),
        avatar: Some("/headimgurl"),
        gender: Some("/sex"),
        error_key: Some("/errcode"),
        error_detail_key: Some("/errmsg"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

pub const TWITTER: SourceSpec = SourceSpec {
    name: "twitter",
    grant: GrantFlavor::OAuth1a,
    authorize_url: "https://api.twitter.com/oauth/authenticate",
    token_url: "https://api.twitter.com/oauth/access_token",
    profile_url: Some("https://api.twitter.com/1.1/account/verify_credentials.json"),
    request_token_url: Some("https://api.twitter.com/oauth/request_token"),
    scope_delimiter: ",",
    token_format: TokenResponseFormat::FormEncoded,
    profile: ProfileMap {
        uid: "/id_str",
        username: "/screen_name",
        nickname: Some("/name"),
        avatar: Some("/profile_image_url_https"),
        remark: Some("/description"),
        ..ProfileMap::DEFAULT
    },
    ..SourceSpec::DEFAULT
};

/// Every source shipped with the crate, ready for registry insertion.
#[must_use]
pub fn all() -> Vec<Arc<dyn AuthSource>> {
    let oauth2_specs = [
        GITHUB,
        GITEE,
        GOOGLE,
        FACEBOOK,
        MICROSOFT,
        LINKEDIN,
        SLACK,
        AMAZON,
        LINE,
        WEIBO,
        BAIDU,
        CODING,
        OSCHINA,
        DOUYIN,
        STACK_OVERFLOW,
        WECHAT,
    ];
    let mut sources: Vec<Arc<dyn AuthSource>> = oauth2_specs
        .into_iter()
        .map(|spec| Arc::new(DescriptorSource::new(spec)) as Arc<dyn AuthSource>)
        .collect();
    sources.push(Arc::new(Oauth1Source::new(TWITTER)));
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sources_have_unique_names() {
        let sources = all();
        let mut names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
        assert_eq!(before, 17);
    }

    #[test]
    fn test_oauth1_sources_declare_request_token_endpoints() {
        for source in all() {
            if source.spec().grant == GrantFlavor::OAuth1a {
                assert!(
                    source.spec().request_token_url.is_some(),
                    "{} lacks a request token endpoint",
                    source.name()
                );
            }
        }
    }
}
