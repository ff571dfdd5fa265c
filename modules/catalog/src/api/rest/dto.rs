//! Request bodies. Attribute kinds sit at the top level of every write
//! body; a kind that is omitted deserializes to an empty list, which on
//! update deletes all stored rows of that kind.

use serde::Deserialize;

use crate::domain::model::{
    AttributesInput, CounterInput, DescriptionInput, FileInput, PermissionInput, PointInput,
    StringInput,
};
use crate::domain::service::{
    BlockWrite, ElementWrite, FileWrite, GroupWrite, PointWrite, Registration, SectionWrite,
    UserWrite,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBody {
    pub id: Option<String>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl BlockBody {
    pub fn into_write(self) -> (Option<String>, BlockWrite) {
        let Self {
            id,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            BlockWrite {
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBody {
    pub id: Option<String>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl SectionBody {
    pub fn into_write(self) -> (Option<String>, SectionWrite) {
        let Self {
            id,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            SectionWrite {
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBody {
    pub id: Option<String>,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl ElementBody {
    pub fn into_write(self) -> (Option<String>, ElementWrite) {
        let Self {
            id,
            blocks,
            sections,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            ElementWrite {
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
                blocks,
                sections,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointBody {
    pub id: Option<String>,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl PointBody {
    pub fn into_write(self) -> (Option<String>, PointWrite) {
        let Self {
            id,
            parent_id,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            PointWrite {
                parent_id,
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: Option<String>,
    pub login: String,
    pub password: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl UserBody {
    pub fn into_write(self) -> (Option<String>, UserWrite) {
        let Self {
            id,
            login,
            password,
            groups,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            UserWrite {
                login,
                password,
                groups,
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBody {
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl GroupBody {
    pub fn into_write(self) -> (Option<String>, GroupWrite) {
        let Self {
            id,
            title,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            GroupWrite {
                title,
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBody {
    pub id: Option<String>,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    #[serde(default)]
    pub strings: Vec<StringInput>,
    #[serde(default)]
    pub descriptions: Vec<DescriptionInput>,
    #[serde(default)]
    pub points: Vec<PointInput>,
    #[serde(default)]
    pub counters: Vec<CounterInput>,
    #[serde(default)]
    pub files: Vec<FileInput>,
    #[serde(default)]
    pub permissions: Vec<PermissionInput>,
}

impl FileBody {
    pub fn into_write(self) -> (Option<String>, FileWrite) {
        let Self {
            id,
            file_name,
            mime_type,
            size,
            strings,
            descriptions,
            points,
            counters,
            files,
            permissions,
        } = self;
        (
            id,
            FileWrite {
                file_name,
                mime_type,
                size,
                attributes: AttributesInput {
                    strings,
                    descriptions,
                    points,
                    counters,
                    files,
                },
                permissions,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub id: Option<String>,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl From<RegisterBody> for Registration {
    fn from(body: RegisterBody) -> Self {
        Registration {
            id: body.id,
            login: body.login,
            password: body.password,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}
