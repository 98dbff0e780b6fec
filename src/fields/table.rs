//! Concept table: every field name each collection has used for a concept,
//! newest spelling first.
//!
//! When a form starts writing a new key, add it at the front of the matching
//! list. Keys never get removed while old documents still carry them.

use super::Concept;

/// Inward lots (the primary collection).
pub mod inward {
    use super::Concept;

    pub const ID: Concept = Concept::new("id", &["id", "_id", "docId"]);
    pub const LOT_ID: Concept = Concept::new("lotId", &["inwardId", "lotId", "lotNumber", "id", "_id"]);
    pub const RECEIPT_TYPE: Concept =
        Concept::new("receiptType", &["receiptType", "srwrType", "receipt.type", "type"]);
    /// Inward date. Also the field the report window is applied to.
    pub const CREATED_AT: Concept =
        Concept::new("createdAt", &["dateOfInward", "inwardDate", "createdAt", "timestamp"]);
    pub const STATE: Concept = Concept::new("state", &["state", "stateName"]);
    pub const BRANCH: Concept = Concept::new("branch", &["branch", "branchName"]);
    pub const LOCATION: Concept = Concept::new("location", &["location", "locationName"]);
    pub const WAREHOUSE_NAME: Concept =
        Concept::new("warehouseName", &["warehouseName", "warehouse.name", "warehouse"]);
    pub const WAREHOUSE_LOCATION: Concept = Concept::new(
        "warehouseLocation",
        &["warehouseLocation", "warehouse.location"],
    );
    pub const WAREHOUSE_TYPE: Concept =
        Concept::new("warehouseType", &["warehouseType", "typeOfWarehouse"]);
    pub const WAREHOUSE_CODE: Concept =
        Concept::new("warehouseCode", &["warehouseCode", "warehouse.code"]);
    pub const CLIENT_NAME: Concept =
        Concept::new("clientName", &["client", "clientName", "client.name"]);
    pub const CLIENT_CODE: Concept =
        Concept::new("clientCode", &["clientCode", "client.code"]);
    pub const COMMODITY: Concept =
        Concept::new("commodity", &["commodity", "commodityName", "commodity.name"]);
    pub const VARIETY: Concept = Concept::new("variety", &["varietyName", "variety"]);
    pub const TOTAL_BAGS: Concept =
        Concept::new("totalBags", &["totalBags", "noOfBags", "bags"]);
    pub const TOTAL_QUANTITY: Concept = Concept::new(
        "totalQuantity",
        &["totalQuantity", "totalWeightMT", "totalWeight", "quantity"],
    );
    pub const BANK_NAME: Concept = Concept::new("bankName", &["bankName", "bank.name", "bank"]);
    pub const BANK_BRANCH: Concept =
        Concept::new("bankBranch", &["bankBranch", "bank.branch"]);
    pub const IFSC: Concept = Concept::new("ifscCode", &["ifscCode", "ifsc", "bank.ifsc"]);
    pub const INSURANCE: Concept = Concept::new(
        "insuranceManagedBy",
        &["insuranceManagedBy", "insurance.managedBy", "insurance"],
    );
    pub const RATE: Concept = Concept::new("rate", &["rate", "ratePerMT", "storageRate"]);
}

/// Release (RO) and delivery (DO) events share most of their shape.
pub mod events {
    use super::Concept;

    /// Field carrying the composite or bare lot key.
    pub const LINK_FIELD: &str = "srwrNo";
    /// Field carrying the inward document id, queried as a last resort.
    pub const INWARD_ID_FIELD: &str = "inwardId";

    pub const CREATED_AT: Concept =
        Concept::new("createdAt", &["createdAt", "created_at", "timestamp"]);
    pub const FUNDING_DATE: Concept =
        Concept::new("fundingDate", &["dateOfFunding", "fundingDate", "funding.date"]);
    pub const VALIDITY_DATE: Concept =
        Concept::new("validityDate", &["validityDate", "validUpto", "validity"]);
    pub const RATE: Concept = Concept::new("rate", &["rate", "ratePerMT", "storageRate"]);
    pub const INSURANCE: Concept = Concept::new(
        "insuranceManagedBy",
        &["insuranceManagedBy", "insurance.managedBy", "insurance"],
    );
    pub const BANK_NAME: Concept = Concept::new("bankName", &["bankName", "bank.name", "bank"]);
    pub const BANK_BRANCH: Concept =
        Concept::new("bankBranch", &["bankBranch", "bank.branch"]);
    pub const IFSC: Concept = Concept::new("ifscCode", &["ifscCode", "ifsc", "bank.ifsc"]);
    pub const IDENTIFIER: Concept = Concept::new("srwrNo", &["srwrNo", "receiptNumber"]);
    pub const COMMODITY: Concept =
        Concept::new("commodity", &["commodity", "commodityName", "commodity.name"]);
    pub const VARIETY: Concept = Concept::new("variety", &["varietyName", "variety"]);

    /// Release-order specific spellings.
    pub mod release {
        use super::Concept;

        pub const STATUS: Concept =
            Concept::new("status", &["roStatus", "releaseStatus", "status"]);
        pub const BAGS: Concept = Concept::new(
            "releaseBags",
            &["releaseBags", "releasedBags", "noOfBags", "bags"],
        );
        pub const QUANTITY: Concept = Concept::new(
            "releaseQuantity",
            &["releaseQuantity", "releasedQuantity", "quantity"],
        );
        pub const EVENT_DATE: Concept =
            Concept::new("releaseDate", &["roDate", "releaseDate", "createdAt"]);
    }

    /// Delivery-order specific spellings.
    pub mod delivery {
        use super::Concept;

        pub const STATUS: Concept =
            Concept::new("status", &["doStatus", "deliveryStatus", "status"]);
        pub const BAGS: Concept = Concept::new(
            "deliveryBags",
            &["deliveryBags", "deliveredBags", "noOfBags", "bags"],
        );
        pub const QUANTITY: Concept = Concept::new(
            "deliveryQuantity",
            &["deliveryQuantity", "deliveredQuantity", "quantity"],
        );
        pub const EVENT_DATE: Concept =
            Concept::new("deliveryDate", &["doDate", "deliveryDate", "createdAt"]);
    }
}

/// Warehouse inspection metadata.
pub mod warehouse {
    use super::Concept;

    pub const NAME_FIELD: &str = "warehouseName";
    pub const LOCATION_FIELD: &str = "location";

    pub const WAREHOUSE_TYPE: Concept = Concept::new(
        "warehouseType",
        &["warehouseType", "typeOfWarehouse", "warehouse.type"],
    );
    pub const WAREHOUSE_CODE: Concept =
        Concept::new("warehouseCode", &["warehouseCode", "code", "warehouse.code"]);
    pub const ADDRESS: Concept = Concept::new(
        "warehouseAddress",
        &["warehouseAddress", "address", "warehouse.address"],
    );
    pub const BUSINESS_TYPE: Concept =
        Concept::new("businessType", &["businessType", "typeOfBusiness"]);
}

/// Bank master.
pub mod bank {
    use super::Concept;

    pub const NAME_FIELD: &str = "bankName";
    pub const STATE_FIELD: &str = "state";
    pub const BRANCH_FIELD: &str = "branch";

    pub const BANK_NAME: Concept = Concept::new("bankName", &["bankName", "name"]);
    pub const BRANCH_NAME: Concept =
        Concept::new("branchName", &["branchName", "bankBranch", "branch"]);
    pub const IFSC: Concept = Concept::new("ifscCode", &["ifscCode", "ifsc", "IFSC"]);
}

/// Client master.
pub mod client {
    use super::Concept;

    pub const CODE_FIELD: &str = "clientCode";
    pub const NAME_FIELD: &str = "clientName";

    pub const FIRM_NAME: Concept =
        Concept::new("firmName", &["firmName", "companyName", "clientName"]);
    pub const BANK_NAME: Concept =
        Concept::new("bankName", &["bankName", "bankDetails.bankName", "bank.name"]);
    pub const BANK_BRANCH: Concept = Concept::new(
        "bankBranch",
        &["bankBranch", "bankDetails.branch", "bank.branch"],
    );
    pub const IFSC: Concept = Concept::new(
        "ifscCode",
        &["ifscCode", "bankDetails.ifscCode", "bank.ifsc"],
    );
}

/// Every concept, for diagnostics and tests.
pub fn all() -> Vec<(&'static str, Concept)> {
    vec![
        ("inward", inward::ID),
        ("inward", inward::LOT_ID),
        ("inward", inward::RECEIPT_TYPE),
        ("inward", inward::CREATED_AT),
        ("inward", inward::STATE),
        ("inward", inward::BRANCH),
        ("inward", inward::LOCATION),
        ("inward", inward::WAREHOUSE_NAME),
        ("inward", inward::WAREHOUSE_LOCATION),
        ("inward", inward::WAREHOUSE_TYPE),
        ("inward", inward::WAREHOUSE_CODE),
        ("inward", inward::CLIENT_NAME),
        ("inward", inward::CLIENT_CODE),
        ("inward", inward::COMMODITY),
        ("inward", inward::VARIETY),
        ("inward", inward::TOTAL_BAGS),
        ("inward", inward::TOTAL_QUANTITY),
        ("inward", inward::BANK_NAME),
        ("inward", inward::BANK_BRANCH),
        ("inward", inward::IFSC),
        ("inward", inward::INSURANCE),
        ("inward", inward::RATE),
        ("events", events::CREATED_AT),
        ("events", events::FUNDING_DATE),
        ("events", events::VALIDITY_DATE),
        ("events", events::RATE),
        ("events", events::INSURANCE),
        ("events", events::BANK_NAME),
        ("events", events::BANK_BRANCH),
        ("events", events::IFSC),
        ("events", events::IDENTIFIER),
        ("events", events::COMMODITY),
        ("events", events::VARIETY),
        ("release", events::release::STATUS),
        ("release", events::release::BAGS),
        ("release", events::release::QUANTITY),
        ("release", events::release::EVENT_DATE),
        ("delivery", events::delivery::STATUS),
        ("delivery", events::delivery::BAGS),
        ("delivery", events::delivery::QUANTITY),
        ("delivery", events::delivery::EVENT_DATE),
        ("warehouse", warehouse::WAREHOUSE_TYPE),
        ("warehouse", warehouse::WAREHOUSE_CODE),
        ("warehouse", warehouse::ADDRESS),
        ("warehouse", warehouse::BUSINESS_TYPE),
        ("bank", bank::BANK_NAME),
        ("bank", bank::BRANCH_NAME),
        ("bank", bank::IFSC),
        ("client", client::FIRM_NAME),
        ("client", client::BANK_NAME),
        ("client", client::BANK_BRANCH),
        ("client", client::IFSC),
    ]
}
