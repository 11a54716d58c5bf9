//! Seed data: the fixed per-regime category taxonomies and the built-in
//! keyword rules derived from them.
//!
//! Category names are a closed set per regime. The engine validates every
//! AI suggestion against this set, so the names here are load-bearing.

use crate::models::CategoryType;

/// HMRC / Self Assessment taxonomy (individuals and sole traders).
/// SA103 business expense boxes first, then household expenses, then income.
pub const HMRC_CATEGORIES: &[(&str, CategoryType)] = &[
    // SA103 business expenses
    ("Office Costs", CategoryType::Expense),
    ("Travel", CategoryType::Expense),
    ("Vehicle Costs", CategoryType::Expense),
    ("Clothing", CategoryType::Expense),
    ("Staff Costs", CategoryType::Expense),
    ("Goods for Resale", CategoryType::Expense),
    ("Premises Costs", CategoryType::Expense),
    ("Marketing & Advertising", CategoryType::Expense),
    ("Bank & Finance Charges", CategoryType::Expense),
    ("Professional Fees", CategoryType::Expense),
    ("Software & IT", CategoryType::Expense),
    ("Other Business Expenses", CategoryType::Expense),
    // Household expenses
    ("Utilities", CategoryType::Expense),
    ("Telecoms", CategoryType::Expense),
    ("Council Tax", CategoryType::Expense),
    ("Insurance", CategoryType::Expense),
    ("Subscriptions", CategoryType::Expense),
    ("Groceries", CategoryType::Expense),
    ("Dining & Takeaway", CategoryType::Expense),
    ("Shopping", CategoryType::Expense),
    ("Housing", CategoryType::Expense),
    ("Healthcare", CategoryType::Expense),
    ("Education", CategoryType::Expense),
    ("Entertainment", CategoryType::Expense),
    ("Personal Care", CategoryType::Expense),
    ("TV License", CategoryType::Expense),
    ("Childcare", CategoryType::Expense),
    ("Transfers", CategoryType::Expense),
    ("Other Expenses", CategoryType::Expense),
    // Income
    ("Salary", CategoryType::Income),
    ("Client Payments", CategoryType::Income),
    ("Business Income", CategoryType::Income),
    ("Dividends", CategoryType::Income),
    ("Interest", CategoryType::Income),
    ("Rental Income", CategoryType::Income),
    ("Refunds", CategoryType::Income),
    ("Benefits", CategoryType::Income),
    ("Other Income", CategoryType::Income),
];

/// Companies House / CT600 taxonomy (limited companies, LLPs, partnerships).
pub const CH_CATEGORIES: &[(&str, CategoryType)] = &[
    // Income
    ("Turnover / Revenue", CategoryType::Income),
    ("Other Operating Income", CategoryType::Income),
    ("Interest Receivable", CategoryType::Income),
    ("Director Loan Repayment In", CategoryType::Income),
    ("Shareholder Investment", CategoryType::Income),
    // P&L / CT600 expenses
    ("Cost of Sales", CategoryType::Expense),
    ("Directors Remuneration", CategoryType::Expense),
    ("Employee Costs", CategoryType::Expense),
    ("Rent & Rates", CategoryType::Expense),
    ("Repairs & Maintenance", CategoryType::Expense),
    ("Motor Expenses", CategoryType::Expense),
    ("Travel & Subsistence", CategoryType::Expense),
    ("Telephone & Internet", CategoryType::Expense),
    ("Postage & Stationery", CategoryType::Expense),
    ("Advertising & Marketing", CategoryType::Expense),
    ("Professional Fees (Company)", CategoryType::Expense),
    ("Bank Charges & Interest Payable", CategoryType::Expense),
    ("Insurance (Company)", CategoryType::Expense),
    ("Software & Subscriptions (Company)", CategoryType::Expense),
    ("Depreciation", CategoryType::Expense),
    ("Entertainment (Non-Allowable)", CategoryType::Expense),
    ("Dividend Payments", CategoryType::Expense),
    ("Corporation Tax Payment", CategoryType::Expense),
    ("VAT Payment", CategoryType::Expense),
    ("PAYE/NI Payment", CategoryType::Expense),
    ("Pension Contributions (Company)", CategoryType::Expense),
    ("Director Loan Out", CategoryType::Expense),
    ("Fixed Asset Purchase", CategoryType::Expense),
    ("Training & Development", CategoryType::Expense),
    ("Sundry Expenses", CategoryType::Expense),
    ("Transfers", CategoryType::Expense),
];

/// Built-in keyword rules for the HMRC taxonomy: (category name, keywords).
/// Common UK merchants and narrative fragments; matched case-insensitively
/// as substrings of the transaction description.
pub const HMRC_KEYWORDS: &[(&str, &[&str])] = &[
    // Income
    ("Salary", &["salary", "wages", "payroll", "pay slip", "paye"]),
    (
        "Client Payments",
        &[
            "client",
            "invoice paid",
            "payment received",
            "faster payments received",
            "bacs credit",
        ],
    ),
    (
        "Business Income",
        &["revenue", "sales", "trade income", "receipt"],
    ),
    (
        "Refunds",
        &[
            "refund",
            "reimbursement",
            "cashback",
            "reversal",
            "returned payment",
        ],
    ),
    (
        "Interest",
        &["interest earned", "savings interest", "bank interest"],
    ),
    ("Dividends", &["dividend"]),
    (
        "Benefits",
        &[
            "universal credit",
            "tax credit",
            "dwp",
            "hmrc",
            "child benefit",
        ],
    ),
    // SA103 business expenses
    (
        "Office Costs",
        &[
            "office",
            "stationery",
            "supplies",
            "royal mail",
            "post office",
            "printing",
            "instantprint",
            "vistaprint",
            "postage",
            "stamps",
        ],
    ),
    (
        "Travel",
        &[
            "train",
            "uber",
            "taxi",
            "tfl",
            "railway",
            "national express",
            "megabus",
            "easyjet",
            "ryanair",
            "flight",
        ],
    ),
    (
        "Vehicle Costs",
        &[
            "fuel",
            "petrol",
            "diesel",
            "parking",
            "euro car parks",
            "mot",
            "car wash",
            "halfords",
            "kwik fit",
        ],
    ),
    (
        "Staff Costs",
        &["payroll", "subcontractor", "freelancer fee", "contractor"],
    ),
    (
        "Premises Costs",
        &["office rent", "business rates", "commercial"],
    ),
    (
        "Marketing & Advertising",
        &[
            "advertising",
            "google ads",
            "facebook ads",
            "meta ads",
            "marketing",
            "promotion",
            "canva",
            "mailchimp",
        ],
    ),
    (
        "Bank & Finance Charges",
        &[
            "bank fee",
            "overdraft fee",
            "finance charge",
            "merchant fee",
            "stripe fee",
            "paypal fee",
        ],
    ),
    (
        "Professional Fees",
        &[
            "accountant",
            "solicitor",
            "lawyer",
            "consultant",
            "legal fee",
            "audit",
        ],
    ),
    (
        "Software & IT",
        &[
            "software",
            "adobe",
            "microsoft 365",
            "quickbooks",
            "intuit",
            "zoom",
            "slack",
            "hosting",
            "domain",
            "aws",
            "google workspace",
            "notion",
            "figma",
            "github",
        ],
    ),
    // Household expenses
    (
        "Utilities",
        &[
            "electric",
            "gas bill",
            "water bill",
            "edf",
            "british gas",
            "eon",
            "octopus energy",
            "ovo",
            "thames water",
            "utility",
        ],
    ),
    (
        "Telecoms",
        &[
            "vodafone",
            "ee",
            "three",
            "o2",
            "giffgaff",
            "bt broadband",
            "sky",
            "virgin media",
            "broadband",
            "mobile phone",
        ],
    ),
    ("Council Tax", &["council tax", "local authority"]),
    (
        "Insurance",
        &[
            "insurance",
            "aviva",
            "admiral",
            "direct line",
            "axa",
            "zurich",
            "cover note",
        ],
    ),
    (
        "Subscriptions",
        &[
            "netflix",
            "spotify",
            "amazon prime",
            "disney+",
            "apple.com/bill",
            "google storage",
            "icloud",
            "youtube premium",
            "audible",
        ],
    ),
    (
        "Groceries",
        &[
            "tesco",
            "sainsbury",
            "asda",
            "morrisons",
            "aldi",
            "lidl",
            "co-op",
            "waitrose",
            "grocery",
            "supermarket",
            "costco",
            "ocado",
            "m&s food",
            "iceland",
        ],
    ),
    (
        "Dining & Takeaway",
        &[
            "restaurant",
            "cafe",
            "coffee",
            "starbucks",
            "costa",
            "mcdonalds",
            "kfc",
            "deliveroo",
            "uber eats",
            "just eat",
            "greggs",
            "pret",
            "nandos",
            "dominos",
            "pizza",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon.co.uk",
            "ebay",
            "argos",
            "john lewis",
            "next",
            "primark",
            "h&m",
            "zara",
            "asos",
            "tk maxx",
            "currys",
            "screwfix",
        ],
    ),
    (
        "Housing",
        &[
            "rent",
            "mortgage",
            "b&q",
            "homebase",
            "ikea",
            "furniture",
            "home improvement",
            "rightmove",
        ],
    ),
    (
        "Healthcare",
        &[
            "pharmacy",
            "boots",
            "superdrug",
            "nhs",
            "doctor",
            "dentist",
            "optician",
            "specsavers",
        ],
    ),
    (
        "Education",
        &[
            "school",
            "college",
            "university",
            "course",
            "tuition",
            "training",
            "udemy",
            "coursera",
        ],
    ),
    (
        "Entertainment",
        &[
            "cinema",
            "theatre",
            "concert",
            "ticket",
            "leisure",
            "gaming",
            "steam",
            "playstation",
            "xbox",
        ],
    ),
    (
        "Personal Care",
        &[
            "salon",
            "barber",
            "beauty",
            "spa",
            "hair",
            "gym",
            "puregym",
            "david lloyd",
            "fitness",
        ],
    ),
    (
        "Childcare",
        &["nursery", "childminder", "after school", "childcare"],
    ),
    (
        "Transfers",
        &[
            "transfer to",
            "standing order",
            "internal transfer",
            "transfer between",
        ],
    ),
];

/// Built-in keyword rules for the Companies House taxonomy.
pub const CH_KEYWORDS: &[(&str, &[&str])] = &[
    // Income
    (
        "Turnover / Revenue",
        &[
            "invoice paid",
            "payment received",
            "bacs credit",
            "faster payments received",
            "client payment",
            "sales receipt",
            "fee income",
        ],
    ),
    (
        "Other Operating Income",
        &["grant", "royalty", "commission received", "rental income"],
    ),
    (
        "Interest Receivable",
        &["interest earned", "savings interest", "bank interest"],
    ),
    (
        "Director Loan Repayment In",
        &["director loan repay", "loan repayment from director"],
    ),
    (
        "Shareholder Investment",
        &["share capital", "shareholder inject", "capital contribution"],
    ),
    // Expenses
    (
        "Cost of Sales",
        &[
            "stock purchase",
            "materials",
            "raw materials",
            "wholesale",
            "manufacturer",
            "components",
        ],
    ),
    (
        "Directors Remuneration",
        &["director salary", "director pay", "director fee"],
    ),
    (
        "Employee Costs",
        &[
            "payroll",
            "wages",
            "salary",
            "pension contribution",
            "employer ni",
            "staff pay",
        ],
    ),
    (
        "Rent & Rates",
        &[
            "office rent",
            "business rates",
            "commercial rent",
            "warehouse rent",
        ],
    ),
    (
        "Repairs & Maintenance",
        &[
            "repair",
            "maintenance",
            "plumber",
            "electrician",
            "building work",
        ],
    ),
    (
        "Motor Expenses",
        &[
            "fuel",
            "petrol",
            "diesel",
            "parking",
            "company car",
            "vehicle insurance",
            "mot",
        ],
    ),
    (
        "Travel & Subsistence",
        &[
            "train",
            "uber",
            "taxi",
            "tfl",
            "flight",
            "hotel",
            "accommodation",
            "easyjet",
            "ryanair",
        ],
    ),
    (
        "Telephone & Internet",
        &[
            "vodafone",
            "ee",
            "three",
            "o2",
            "bt broadband",
            "sky business",
            "broadband",
            "mobile phone",
        ],
    ),
    (
        "Postage & Stationery",
        &[
            "royal mail",
            "post office",
            "stationery",
            "stamps",
            "printing",
            "supplies",
        ],
    ),
    (
        "Advertising & Marketing",
        &[
            "google ads",
            "facebook ads",
            "meta ads",
            "advertising",
            "marketing",
            "canva",
            "mailchimp",
        ],
    ),
    (
        "Professional Fees (Company)",
        &[
            "accountant",
            "solicitor",
            "lawyer",
            "consultant",
            "legal fee",
            "audit fee",
            "companies house fee",
        ],
    ),
    (
        "Bank Charges & Interest Payable",
        &[
            "bank fee",
            "bank charge",
            "overdraft fee",
            "loan interest",
            "merchant fee",
            "stripe fee",
            "paypal fee",
        ],
    ),
    (
        "Insurance (Company)",
        &[
            "business insurance",
            "professional indemnity",
            "public liability",
            "employers liability",
        ],
    ),
    (
        "Software & Subscriptions (Company)",
        &[
            "software",
            "adobe",
            "microsoft 365",
            "quickbooks",
            "zoom",
            "slack",
            "hosting",
            "aws",
            "github",
            "saas",
        ],
    ),
    (
        "Entertainment (Non-Allowable)",
        &[
            "restaurant",
            "client entertainment",
            "hospitality",
            "client dinner",
        ],
    ),
    (
        "Dividend Payments",
        &["dividend", "shareholder distribution"],
    ),
    (
        "Corporation Tax Payment",
        &["corporation tax", "hmrc ct", "ct payment"],
    ),
    ("VAT Payment", &["vat payment", "hmrc vat", "vat return"]),
    ("PAYE/NI Payment", &["paye", "employer ni", "hmrc paye"]),
    (
        "Pension Contributions (Company)",
        &["pension", "workplace pension", "auto enrolment"],
    ),
    (
        "Director Loan Out",
        &["director loan", "loan to director"],
    ),
    (
        "Fixed Asset Purchase",
        &[
            "computer",
            "laptop",
            "equipment",
            "machinery",
            "furniture",
            "capital purchase",
        ],
    ),
    (
        "Training & Development",
        &["training", "course", "cpd", "seminar", "conference"],
    ),
    (
        "Transfers",
        &[
            "transfer to",
            "standing order",
            "internal transfer",
            "transfer between",
        ],
    ),
];
