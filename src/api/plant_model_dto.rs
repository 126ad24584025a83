use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantModelDto {
    #[serde(default)]
    pub points: Vec<ResourceDto>,
    #[serde(default)]
    pub paths: Vec<PathDto>,
    #[serde(default)]
    pub locations: Vec<ResourceDto>,
    #[serde(default)]
    pub blocks: Vec<BlockDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    pub name: String,
    #[serde(default)]
    pub attached: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDto {
    pub name: String,
    pub source_point: String,
    pub destination_point: String,
    #[serde(default)]
    pub attached: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDto {
    pub name: String,
    pub members: Vec<String>,
}
