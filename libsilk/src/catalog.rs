//! The curated catalog of projects along the Green Silk Road
use crate::{error::Result, record::GeoRecord, session::Session, store::RecordStore};
use tracing::info;

struct Project {
    name: &'static str,
    latitude: f64,
    longitude: f64,
    description: &'static str,
    kind: &'static str,
}

const SOCIAL_ENTERPRISE: &str = "social enterprise";

const PROJECTS: [Project; 14] = [
    Project {
        name: "Another School is Possible",
        latitude: 37.070160,
        longitude: 27.35767,
        description: "alternative education movement",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Earthist",
        latitude: 38.423733,
        longitude: 27.142826,
        description: "Hemp value chain community",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Bread Houses Network",
        latitude: 42.702179,
        longitude: 23.333359,
        description: "creates and unites centers for community-building, creativity, and social entrepreneurship with the mission to inspire through collective bread-making",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Keystone Foundation",
        latitude: 11.430735,
        longitude: 76.8569853,
        description: "program areas include: livelihoods, conservation, organic market development, environmental governance, training and information",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Just Change",
        latitude: 11.505573,
        longitude: 76.4946414,
        description: "Producer-Consumer coop with innovative stakeholder governance model",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Sristi Village",
        latitude: 12.072053,
        longitude: 79.6298409,
        description: "working with individuals who have intellectual and developmental disabilities",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Puvidham",
        latitude: 12.0887125,
        longitude: 78.046902,
        description: "School that champions localisation and integrates it in all aspects of their work",
        kind: "school",
    },
    Project {
        name: "Marudam",
        latitude: 12.2094503,
        longitude: 79.0248104,
        description: "education at Marudam Farm School will help to bring about sensitive and intelligent human beings. Children will discover not only their interests and passions, but also nurture skills in both academic and non-academic areas that will help them meet any life challenges. We care for the land and use it as a rich educational resource, integral to the learning process.",
        kind: "school",
    },
    Project {
        name: "reStore / OFM",
        latitude: 12.9674536,
        longitude: 80.2547327,
        description: "reStore works with small and marginal farmers as well as other rural producers to support their livelihoods. We operate a not-for profit shop where we sell 100% organic foods sourced directly from farmers. Organic verification is done by means of personal visits to see their farms and understand their work, and price-setting is by mutual consent.",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Raddis cotton",
        latitude: 14.4486919,
        longitude: 78.8241272,
        description: "circular, climate neutral cotton cooperative",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "DDS - Disha",
        latitude: 17.4453544,
        longitude: 78.4600139,
        description: "Deccan Development Society partnered with a consumer group called Disha to build a healthy, local food brand and retail chain",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "Siddarth Ecovillage",
        latitude: 18.939272,
        longitude: 83.0117942,
        description: "Ecovillage in Orissa. We at Siddharth Village are committed to raising awareness on India's indigenous population as well as working towards achieving ecological balance and individual and community empowerment",
        kind: "ecovillage",
    },
    Project {
        name: "Gender Lab",
        latitude: 19.253,
        longitude: 72.8559132,
        description: "learning about gender bias and breaking stereotypes",
        kind: SOCIAL_ENTERPRISE,
    },
    Project {
        name: "SEWA Trade Facilitation Centre",
        latitude: 23.0257292,
        longitude: 72.6116115,
        description: "artisans are the producers, owners and managers of STFC that reaches global market by coordination of design, production, and marketing of traditional embroidery.",
        kind: SOCIAL_ENTERPRISE,
    },
];

/// The catalog as candidate records
pub fn catalog() -> Vec<GeoRecord> {
    PROJECTS
        .iter()
        .map(|p| {
            GeoRecord::candidate(
                p.name.to_string(),
                p.latitude,
                p.longitude,
                Some(p.description.to_string()),
                Some(p.kind.to_string()),
            )
        })
        .collect()
}

/// Insert the whole catalog for the signed-in user and return the number of
/// records that were added
pub async fn seed_catalog(session: &Session, store: &dyn RecordStore) -> Result<usize> {
    let user = session.require_user("upload projects")?;
    let records = catalog()
        .into_iter()
        .map(|r| r.submitted_by(user.id))
        .collect();
    let inserted = store.insert(records).await?;
    info!(count = inserted.len(), user = %user.username, "seeded project catalog");
    Ok(inserted.len())
}
